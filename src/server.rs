use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use color_eyre::Result;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::pipeline::briefing::BriefingResult;
use crate::pipeline::{DecisionPipeline, DecisionRequest};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pipeline: DecisionPipeline,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::any());

    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/reset", post(reset_handler))
        .route("/history", get(history_handler))
        .route("/summary", get(summary_handler))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Multipart fields accepted by `/analyze`
#[derive(Debug, Default)]
struct AnalyzeForm {
    query: Option<String>,
    file: Option<String>,
    needs_chart: Option<String>,
}

impl AnalyzeForm {
    async fn read(multipart: &mut Multipart) -> std::result::Result<Self, String> {
        let mut form = AnalyzeForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|error| format!("Invalid form data: {error}"))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "query" => {
                    form.query = Some(field.text().await.map_err(|error| error.to_string())?);
                }
                "needs_chart" => {
                    form.needs_chart =
                        Some(field.text().await.map_err(|error| error.to_string())?);
                }
                "file" => {
                    let bytes = field.bytes().await.map_err(|error| error.to_string())?;
                    if !bytes.is_empty() {
                        form.file = Some(String::from_utf8_lossy(&bytes).into_owned());
                    }
                }
                other => warn!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }

    /// Anything other than `"true"` (any case) turns charts off
    fn wants_chart(&self) -> bool {
        self.needs_chart
            .as_deref()
            .is_none_or(|flag| flag.trim().eq_ignore_ascii_case("true"))
    }
}

async fn analyze_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match AnalyzeForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response();
        }
    };

    let wants_chart = form.wants_chart();
    let Some(query) = form.query else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Missing form field: query" })),
        )
            .into_response();
    };

    let request = DecisionRequest::new(query, form.file, wants_chart);
    Json(state.pipeline.decide(&request).await).into_response()
}

async fn reset_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.history().clear().await {
        Ok(()) => {
            info!("history cleared");
            Json(json!({ "message": "Memory cleared" })).into_response()
        }
        Err(error) => internal_error(&error),
    }
}

async fn history_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.history().all().await {
        Ok(turns) => Json(turns).into_response(),
        Err(error) => internal_error(&error),
    }
}

async fn summary_handler(State(state): State<AppState>) -> Json<BriefingResult> {
    Json(state.pipeline.session_briefing().await)
}

fn internal_error(error: &color_eyre::Report) -> Response {
    warn!(%error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

pub async fn start_server(state: AppState, bind_addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("VizWiz server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
