//! Function-style entry point: reads one invocation event as JSON from stdin,
//! writes one `{ "status", "body" }` response to stdout.

use std::io::Read;
use std::sync::Arc;

use learnsmart::{
    config::Config,
    handlers::{invoke, FunctionEvent},
    services::{GroqClient, SummaryService},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::json_requested());

    let config = Config::from_env()?;
    let client = GroqClient::from_config(&config)?;
    let service = SummaryService::new(Arc::new(client), config.generation.clone());

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let event: FunctionEvent = serde_json::from_str(&raw)?;

    let response = invoke(&service, event).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}
