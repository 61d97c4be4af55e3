//! Single-shot entry point for function hosts.
//!
//! The event's `body` may arrive as a JSON string (from an HTTP gateway) or as an
//! already-decoded object (from a console test invocation). Both are normalized
//! into a [`ReportRequest`] before the shared pipeline runs.

use crate::gemini::TextGenerator;
use crate::report::{self, ReportError, ReportRequest};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON document, already encoded.
    pub body: String,
}

impl HandlerResponse {
    fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body: body.to_string() }
    }
}

impl From<ReportError> for HandlerResponse {
    fn from(e: ReportError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            tracing::error!(error = %e, "report generation failed");
        }
        Self::new(status.as_u16(), json!({ "error": e.to_string() }))
    }
}

pub async fn handle(event: Value, generator: &dyn TextGenerator) -> HandlerResponse {
    match run(event, generator).await {
        Ok(result) => HandlerResponse::new(200, json!({ "result": result })),
        Err(e) => e.into(),
    }
}

/// Like [`handle`], but starting from the raw event text. Undecodable input is
/// answered with a 500 response instead of an error.
pub async fn handle_raw(raw: &str, generator: &dyn TextGenerator) -> HandlerResponse {
    if raw.trim().is_empty() {
        return handle(json!({}), generator).await;
    }
    match serde_json::from_str(raw) {
        Ok(event) => handle(event, generator).await,
        Err(e) => ReportError::from(e).into(),
    }
}

async fn run(event: Value, generator: &dyn TextGenerator) -> Result<String, ReportError> {
    let request = normalize_body(event)?;
    tracing::info!(?request, "parsed request body");
    report::generate_report(generator, request).await
}

fn normalize_body(mut event: Value) -> Result<ReportRequest, ReportError> {
    let body = match event.get_mut("body").map(Value::take) {
        Some(Value::String(raw)) => serde_json::from_str(&raw)?,
        Some(body) => body,
        None => Value::Null,
    };
    // falsy bodies and non-object values carry no fields
    match body {
        body @ Value::Object(_) => Ok(serde_json::from_value(body)?),
        _ => Ok(ReportRequest::default()),
    }
}
