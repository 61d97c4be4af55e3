use crate::config::CorsPolicy;
use crate::gemini::TextGenerator;
use crate::report::{self, ReportError};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, options, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub cors: CorsPolicy,
}

pub fn routes(state: AppState) -> Router {
    let cors = state.cors.layer();
    Router::new()
        .route("/", get(health).layer(cors.clone()))
        // CORS on GET/POST only; preflight has its own handler
        .route("/generate-report", post(generate_report).layer(cors))
        .route("/generate-report", options(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    "Server is running!"
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let request = report::parse_body(&body)?;
    let result = report::generate_report(state.generator.as_ref(), request).await?;
    Ok(Json(GenerateResponse { result }))
}

async fn preflight(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let mut out = HeaderMap::new();
    if let Some(origin) = state.cors.allow_origin(headers.get(header::ORIGIN)) {
        out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    out.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    out.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    out.insert(header::VARY, HeaderValue::from_static("Origin"));
    (StatusCode::NO_CONTENT, out)
}

// -------------------------------------------------------------------
// DTOs & errors

#[derive(Serialize)]
struct GenerateResponse {
    result: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self { status: e.status(), message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "report generation failed");
        } else {
            tracing::info!(status = self.status.as_u16(), error = %self.message, "rejected report request");
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
