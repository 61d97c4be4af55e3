use crate::gemini::DEFAULT_API_BASE;
use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use std::env;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173";

/// Resolved once at startup and handed to whatever needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub host: String,
    pub port: u16,
    pub cors: CorsPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("GEMINI_API_KEY is not set; report generation will fail upstream");
            String::new()
        });
        let gemini_api_base =
            env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_PORT);
        let origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());
        let cors = CorsPolicy::parse(&origins)?;

        Ok(Self { gemini_api_key, gemini_api_base, host, port, cors })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().context("invalid HOST/PORT")
    }
}

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsPolicy {
    Any,
    List(Vec<HeaderValue>),
}

impl CorsPolicy {
    pub const METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

    /// `*` anywhere in the list means any origin; otherwise a comma separated allow-list.
    pub fn parse(raw: &str) -> Result<Self> {
        let entries: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        if entries.contains(&"*") {
            return Ok(CorsPolicy::Any);
        }
        let origins = entries
            .into_iter()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(CorsPolicy::List(origins))
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` if the origin is not allowed.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            CorsPolicy::Any => Some(HeaderValue::from_static("*")),
            CorsPolicy::List(list) => origin.filter(|o| list.contains(o)).cloned(),
        }
    }

    pub fn layer(&self) -> CorsLayer {
        let origin = match self {
            CorsPolicy::Any => AllowOrigin::any(),
            CorsPolicy::List(list) => AllowOrigin::list(list.clone()),
        };
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Self::METHODS)
            .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION])
    }
}
