use tracing::info;

use crate::{BuildArgs, build::Builder, commands::load_project, site::load_site};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let (config, config_path, base_path) = load_project(args.config_file.as_deref())?;
    info!(config = %config_path.display(), "loaded config");

    let site = load_site(config)?;
    let result = Builder::new(site, base_path).build()?;

    info!(
        documents = result.documents,
        passthrough_files = result.passthrough_files,
        "built site to {}",
        result.output_dir.display()
    );

    Ok(())
}
