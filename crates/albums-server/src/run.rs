use crate::config::ServerConfig;
use crate::error::Result;
use albums_app::state::AppState;
use albums_dal::Backend;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    run_graceful_with_state(args, state, shutdown_signal()).await
}

/// Serves until `shutdown_signal` completes, then closes database pool
pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let app = main_router(state.clone());

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    debug!("Server stopped, closing database pool");
    state.pool().close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
}

pub fn main_router(state: AppState) -> Router<()> {
    let upload_limit_mb = state.config().upload_limit_mb;
    Router::new()
        .nest(
            "/albums",
            albums_app::rest_api::album::router(upload_limit_mb),
        )
        .with_state(state)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Connects to database and creates schema, any error here is fatal
pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let backend = Backend::from_url(&config.database_url)?;
    let pool = albums_dal::new_pool(&config.database_url, &config.pool_config()).await?;
    albums_dal::ensure_schema(&pool, backend).await?;
    info!("Connected to {backend} database");

    Ok(AppState::new(config.into(), pool, backend))
}
