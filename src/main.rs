use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use delivery_booking::api;
use delivery_booking::config::Config;
use delivery_booking::engine;
use delivery_booking::error::AppError;
use delivery_booking::notify::LogNotifier;
use delivery_booking::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let http_port = config.http_port;
    let auto_assign = config.auto_assign;
    let (app_state, booking_rx) = AppState::new(config, Arc::new(LogNotifier));
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::assignment::run_assignment_engine(
        shared_state.clone(),
        booking_rx,
    ));

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, auto_assign, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);

    if config.log_json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
