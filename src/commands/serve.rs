use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::{
    ServeArgs, api,
    build::{BuildResult, Builder, ChangeKind, FileWatcher, PathClassifier, WatchEvent, WatchPaths},
    commands::load_project,
    config::ProjectConfig,
    site::load_site,
};

/// Where pages listen for reload events.
pub const LIVE_RELOAD_PATH: &str = "/_quire/live-reload";

/// SSE handler for live reload notifications.
async fn live_reload_handler(
    State(tx): State<broadcast::Sender<()>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = tx.subscribe();
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(_) => {
                    yield Ok(Event::default().event("reload").data("reload"));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed some messages, but that's fine - we just need the latest
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// The dev server: API routes and live reload first, the built site as fallback.
pub fn app(output_dir: &Path, reload_tx: broadcast::Sender<()>) -> Router {
    let serve_dir = ServeDir::new(output_dir).append_index_html_on_directories(true);

    Router::new()
        .route(LIVE_RELOAD_PATH, get(live_reload_handler))
        .with_state(reload_tx)
        .merge(api::router())
        .fallback_service(serve_dir)
}

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let (config, config_path, base_path) = load_project(args.config_file.as_deref())?;

    // Create broadcast channel for live reload
    let (reload_tx, _) = broadcast::channel::<()>(16);

    // Build the site first
    info!("building site");
    let result = do_build(config.clone(), &base_path)?;
    info!(
        documents = result.documents,
        passthrough_files = result.passthrough_files,
        "built site"
    );

    // Set up file watcher if enabled
    let _watcher_handle = if args.watch {
        let site = load_site(config.clone())?;
        let watch_paths = WatchPaths {
            input_dir: canonical(&base_path.join(&site.config.dir.input)),
            output_dir: canonical(&result.output_dir),
            config_path: canonical(&config_path),
        };
        let classifier = PathClassifier::new(watch_paths.clone(), &site.config);

        match FileWatcher::new(&config.dev.watch, &watch_paths, classifier) {
            Ok(watcher) => {
                info!("watching for changes");

                let rebuild_base = base_path.clone();
                let rebuild_config_path = config_path.clone();
                let watcher_reload_tx = reload_tx.clone();
                let mut current_config = config.clone();
                let mut previous = result.clone();

                Some(tokio::task::spawn_blocking(move || {
                    while let Some(event) = watcher.recv() {
                        match event {
                            WatchEvent::FilesChanged(changes) => {
                                info!(changes = changes.len(), "detected changes, rebuilding");
                                for change in &changes {
                                    if let Some(path) = change.path() {
                                        let action =
                                            if change.is_removal() { "removed" } else { "changed" };
                                        tracing::debug!(path = %path.display(), "{}", action);
                                    }
                                }

                                if changes.contains(&ChangeKind::Config) {
                                    match ProjectConfig::load_from_file(&rebuild_config_path) {
                                        Ok(config) => current_config = config,
                                        Err(e) => {
                                            error!("config error, keeping previous config: {}", e);
                                        }
                                    }
                                }

                                match do_build(current_config.clone(), &rebuild_base) {
                                    Ok(result) => {
                                        info!(documents = result.documents, "rebuilt site");
                                        // Outputs of deleted or moved sources
                                        match result.remove_stale(&previous) {
                                            Ok(removed) => {
                                                for path in removed {
                                                    tracing::debug!(path = %path.display(), "removed stale output");
                                                }
                                            }
                                            Err(e) => warn!("failed to remove stale output: {}", e),
                                        }
                                        previous = result;
                                        // Notify connected browsers to reload
                                        let _ = watcher_reload_tx.send(());
                                    }
                                    Err(e) => error!("build error: {}", e),
                                }
                            }
                            WatchEvent::Error(e) => {
                                warn!("watch error: {}", e);
                            }
                        }
                    }
                }))
            }
            Err(e) => {
                warn!("failed to start file watcher: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = app(&result.output_dir, reload_tx);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}", display_host, args.port);

    info!("serving site at {} (press Ctrl+C to stop)", url);

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        warn!("failed to open browser: {}", e);
    }

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the site from `config` and build it in dev mode.
fn do_build(config: ProjectConfig, base_path: &Path) -> Result<BuildResult, anyhow::Error> {
    let live_reload = config.dev.live_reload;
    let site = load_site(config)?;
    let builder = Builder::new(site, base_path.to_path_buf())
        .with_dev_mode(true)
        .with_live_reload(live_reload);
    Ok(builder.build()?)
}

/// Canonicalize a path so it matches the paths in file events.
fn canonical(path: &Path) -> std::path::PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
