use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod routes;

use config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(err) => {
            error!("{err}");
            std::process::exit(2);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    let app = routes::router(&config)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if let Some(root) = &config.static_root {
        info!("serving static files from {}", root.display());
    }

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(l) => l,
        Err(err) => {
            error!("failed to bind {}: {err}", config.addr);
            std::process::exit(1);
        }
    };
    info!("busflow server listening on http://{}", config.addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {err}");
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
    }
    info!("shutting down");
}
