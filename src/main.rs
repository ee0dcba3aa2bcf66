//! tube: static site server with markup directives.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum + tower-http ──▶ Router::serve (blocking pool)
//!                                                │
//!                            request cache ◀─────┤
//!                            route table   ◀─────┤
//!                                                ▼
//!                                   StaticDir / StaticFile handlers
//!                                                │
//!                            document cache ◀────┤
//!                            preprocessor   ◀────┘  include / if directives
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use tube::config::{load_config, ServerConfig, StaticDirConfig};
use tube::http::HttpServer;
use tube::lifecycle::{signals, startup, Shutdown};
use tube::markup::ContentWatcher;
use tube::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "tube", version, about = "Static site server with markup directives")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve this directory at `/` (late tier).
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.root {
        config.static_dirs.push(StaticDirConfig {
            mount: "/".to_string(),
            dir: root,
            late: true,
        });
    }

    logging::init(&config.logging.filter);
    tracing::info!("tube v{} starting", env!("CARGO_PKG_VERSION"));

    if config.metrics.enabled {
        match config.metrics.address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics.address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = Arc::new(startup::build_router(&config)?);

    // dropping the watcher stops it, so keep it for the life of the server
    let _watcher = if config.watch {
        let watcher = startup::content_roots(&config)
            .into_iter()
            .fold(ContentWatcher::new(router.clone()), |w, root| w.watch(root));
        Some(watcher.run()?)
    } else {
        None
    };

    let server = HttpServer::new(router, config.listener.clone());
    let listener = server.bind().await?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal = shutdown.clone();
    tokio::spawn(async move { signals::shutdown_on_ctrl_c(&signal).await });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
