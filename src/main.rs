use anyhow::Result;
use dotenv::dotenv;
use incident_report_relay::{api, config::Config, gemini::GeminiClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    dotenv().ok();
    let config = Config::from_env()?;

    // One provider client for the whole process
    let generator = GeminiClient::new(
        reqwest::Client::new(),
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
    );

    let app = api::routes(api::AppState {
        generator: Arc::new(generator),
        cors: config.cors.clone(),
    });

    // Bind
    let addr = config.addr()?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
