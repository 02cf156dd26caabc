use anyhow::Result;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use macro_scenarios::config::ServerConfig;
use macro_scenarios::routes::{self, AppState};
use macro_scenarios::services::llm::OpenAiClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    // Load configuration, PORT defaults to 3030
    let config = ServerConfig::from_env()?;
    info!(
        "Using PORT: {}, model: {}, response cache: {}",
        config.port,
        config.llm.model,
        if config.cache_responses { "on" } else { "off" }
    );

    // One LLM client and one cache for the whole process
    let llm = OpenAiClient::new(config.llm.clone())?;
    let state = Arc::new(AppState::new(llm, config.cache_responses));

    // Bind to all interfaces
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    // Set up routes
    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
