//! Live mode: datasets are extracted once, every request re-applies the
//! sidebar options and renders a fresh page.

use crate::analysis::build_report;
use crate::domain::model::{DashboardReport, RawData};
use crate::domain::query::DashboardQuery;
use crate::render::export::{climate_csv, study_csv, CLIMATE_CSV, STUDY_CSV};
use crate::render::{render_dashboard, PageMode, RenderContext};
use crate::utils::error::{DashError, ErrorCategory, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    raw: RawData,
    ctx: RenderContext,
    font_path: String,
}

impl AppState {
    pub fn new(raw: RawData, font_path: impl Into<String>) -> Self {
        let font_path = font_path.into();
        Self {
            ctx: RenderContext::detect(PageMode::Live, &font_path),
            raw,
            font_path,
        }
    }

    fn report(&self, query: &DashboardQuery) -> Result<DashboardReport> {
        let options = query.to_options()?;
        build_report(&self.raw, &options, Utc::now())
    }
}

/// Maps crate errors onto HTTP statuses.
pub struct ServerError(DashError);

impl From<DashError> for ServerError {
    fn from(e: DashError) -> Self {
        ServerError(e)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            ErrorCategory::Configuration | ErrorCategory::Data => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self.0);
        } else {
            tracing::warn!("⚠️ Rejected request: {}", self.0);
        }
        (status, self.0.user_friendly_message()).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    climate_rows: usize,
    study_rows: usize,
    climate_fallback: bool,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Html<String>, ServerError> {
    let report = state.report(&query)?;
    Ok(Html(render_dashboard(&report, &state.ctx)))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Response, ServerError> {
    let report = state.report(&query)?;
    let body = match file.as_str() {
        CLIMATE_CSV => climate_csv(&report.climate)?,
        STUDY_CSV => study_csv(&report.study)?,
        _ => return Ok((StatusCode::NOT_FOUND, "unknown download").into_response()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file),
            ),
        ],
        body,
    )
        .into_response())
}

async fn font(State(state): State<Arc<AppState>>) -> Response {
    if state.ctx.font.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read(&state.font_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "font/ttf")], bytes).into_response(),
        Err(e) => {
            tracing::warn!("⚠️ Font file unreadable: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        climate_rows: state.raw.climate.points.len(),
        study_rows: state.raw.study.records.len(),
        climate_fallback: state.raw.climate.origin.is_fallback(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/download/:file", get(download))
        .route("/fonts/Pretendard.ttf", get(font))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("🌐 Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
