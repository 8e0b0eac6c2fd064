mod backend;
mod config;
mod error;
mod languages;
mod routes;
mod state;
mod translate;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

use config::Config;
use state::AppState;

/// First existing config file wins
fn load_config() -> Result<Config> {
    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.yml".to_string()),
        Some("conf.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    for path in &config_paths {
        if !std::path::Path::new(path).exists() {
            continue;
        }
        let cfg = Config::load(path).with_context(|| format!("Invalid config file {}", path))?;
        info!("Loaded configuration from: {}", path);
        config = Some(cfg);
        break;
    }

    let mut config = config.unwrap_or_else(|| {
        warn!("No config file found (tried {:?}), using defaults", config_paths);
        Config::default()
    });
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_with_logging()?;

    let state = AppState::new(config.clone());
    let app = routes::create_app(state.clone());

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("server.host must be an IP address: {}", e))?;
    let addr = SocketAddr::from((host, config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Starting server on {}", addr);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // The model loads while the listener already answers /health; a load failure ends the process
    if let Err(e) = state.initialize_backend().await {
        error!("Failed to load translation model: {:#}", e);
        server.abort();
        return Err(e);
    }

    server.await.context("Server task failed")??;
    Ok(())
}

/// Logging must be up before the config is read, but its filter may come from the config
fn load_config_with_logging() -> Result<Config> {
    let default_filter = config::ServerConfig::default().log_filter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));
    let reload_from_config = std::env::var("RUST_LOG").is_err();

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    if reload_from_config && config.server.log_filter != default_filter {
        handle.reload(EnvFilter::new(&config.server.log_filter))?;
    }
    Ok(config)
}
