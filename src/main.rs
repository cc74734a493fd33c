use tokio::net::TcpListener;

use learnsmart::{
    config::Config,
    handlers::{self, AppState},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::json_requested());

    let config = Config::from_env()?;
    handlers::mark_started();

    tracing::info!("Starting LearnSmart summarization service");
    tracing::info!("Model: {}", config.generation.model);
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);

    let state = AppState::from_config(&config)?;
    let app = handlers::router(state);

    let addr = config.listen_addr();
    tracing::info!("Server running on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
