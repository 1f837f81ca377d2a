use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde_json::{Value, json};

use crate::pipeline::{BatchRequest, ExportOutcome, ExportRequest};
use crate::rules::{ExportFormat, Platform};

use super::{ApiError, AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformInfo {
    id: &'static str,
    name: &'static str,
    max_length: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatInfo {
    id: &'static str,
    name: &'static str,
    mime_type: &'static str,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

pub async fn export(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<ExportOutcome>, ApiError> {
    let Json(request) = payload?;
    let outcome = state.pipeline.export(request).await?;
    Ok(Json(outcome))
}

pub async fn batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<ExportOutcome>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .pipeline
        .export_batch(state.source.as_ref(), request)
        .await?;
    Ok(Json(outcome))
}

pub async fn platforms() -> Json<Value> {
    let platforms: Vec<PlatformInfo> = Platform::ALL
        .iter()
        .map(|platform| {
            let profile = platform.profile();
            PlatformInfo {
                id: platform.id(),
                name: profile.display_name,
                max_length: profile.max_content_length,
            }
        })
        .collect();
    Json(json!({ "platforms": platforms }))
}

pub async fn formats() -> Json<Value> {
    let formats: Vec<FormatInfo> = ExportFormat::ALL
        .iter()
        .map(|format| {
            let profile = format.profile();
            FormatInfo {
                id: format.id(),
                name: profile.display_name,
                mime_type: profile.mime_type,
            }
        })
        .collect();
    Json(json!({ "formats": formats }))
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
