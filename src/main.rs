use anyhow::Context;
use axum::Router;
use axum::extract::State;
use dotenv::dotenv;
use log::info;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;

mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

/// Application state shared across every request handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

/// Extractor alias for pulling [SharedData] out of the request in handlers
pub type AppState = State<Arc<SharedData>>;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let env_filter = logging::init_env_filter();
    let otel_exporters = match (
        env::var(app_env::OTEL_SPAN_EXPORT_URL),
        env::var(app_env::OTEL_METRIC_EXPORT_URL),
    ) {
        (Ok(span_url), Ok(metric_url)) => Some(logging::init_exporters(&span_url, &metric_url)),
        _ => None,
    };
    logging::setup_logging_and_tracing(env_filter, otel_exporters);

    let db_url = env::var(app_env::DB_URL)
        .with_context(|| format!("reading the {} environment variable", app_env::DB_URL))?;
    let db_pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&db_url)
        .await
        .context("connecting to the database")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
    });

    let router = Router::new()
        .nest("/tasks", api::task::task_routes())
        .nest("/comments", api::comment::comment_routes())
        .nest("/users", api::user::user_routes())
        .merge(api::swagger_main::build_documentation());
    let app = logging::attach_tracing_http(router).with_state(shared_data);

    let bind_addr =
        env::var(app_env::SERVER_ADDR).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding the server to {bind_addr}"))?;

    info!("Server is up at {bind_addr}.");
    axum::serve(listener, app)
        .await
        .context("running the HTTP server")?;

    Ok(())
}
