mod api_doc;
mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod store;
mod validation;

use std::net::SocketAddr;

use anyhow::Context;
use api_doc::ApiDoc;
use config::Config;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; production sets variables directly
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("todo-api starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = store::connect(&config.store).await?;

    let app = routes::router(AppState::new(store))
        .merge(SwaggerUi::new(api_doc::SWAGGER_UI).url(api_doc::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.service_host, config.service_port)
        .parse()
        .context("SERVICE_HOST and SERVICE_PORT must form a socket address")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("todo-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
