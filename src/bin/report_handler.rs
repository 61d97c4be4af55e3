//! Runs one report-generation invocation: reads an event from stdin and prints the
//! `{ statusCode, body }` result to stdout.

use anyhow::{Context, Result};
use dotenv::dotenv;
use incident_report_relay::{config::Config, gemini::GeminiClient, handler};
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the response, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    dotenv().ok();
    let config = Config::from_env()?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw).context("failed to read event from stdin")?;
    let generator = GeminiClient::new(
        reqwest::Client::new(),
        config.gemini_api_key,
        config.gemini_api_base,
    );
    let response = handler::handle_raw(&raw, &generator).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
