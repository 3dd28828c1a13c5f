use tracing::info;

use crate::{CleanArgs, commands::load_project, site::load_site};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let (config, _, base_path) = load_project(args.config_file.as_deref())?;

    // Refuses outputs that would take the sources with them
    let site = load_site(config)?;
    let site_path = site.config.dir.output_path(&base_path)?;
    let site_path = site_path.canonicalize().unwrap_or(site_path);

    if !site_path.exists() {
        info!("nothing to clean at {}", site_path.display());
        return Ok(());
    }

    if args.dry_run {
        info!("would delete {}", site_path.display());
    } else {
        tokio::fs::remove_dir_all(&site_path).await?;
        info!("deleted {}", site_path.display());
    }

    Ok(())
}
