pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::net::SocketAddr;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve" | "daemon" | "-d" | "--daemon") => {
            config.validate()?;
            run_server(config, prometheus_handle).await
        }

        Some("init" | "--init") => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some("hash-password") => {
            let Some(password) = args.get(2) else {
                println!("Usage: algoshelf hash-password <password>");
                return Ok(());
            };
            let hash = services::auth::hash_password(password, Some(&config.security))?;
            println!("{hash}");
            println!();
            println!("Put this in config.toml under [security] as admin_password_hash,");
            println!("or export it as ALGOSHELF_ADMIN_PASSWORD_HASH.");
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Algoshelf - personal algorithm notes and project showcase");
    println!();
    println!("USAGE:");
    println!("  algoshelf [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  serve                  Run the web server (default)");
    println!("  init                   Create default config file");
    println!("  hash-password <pw>     Print the Argon2id hash for an admin password");
    println!("  help                   Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml, or set ALGOSHELF_ADMIN_PASSWORD_HASH and");
    println!("  ALGOSHELF_TOKEN_SIGNING_KEY in the environment.");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Algoshelf v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let app_state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let app = api::router(app_state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| {
        error!("Web server error: {e}");
        anyhow::anyhow!(e)
    })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }
}
