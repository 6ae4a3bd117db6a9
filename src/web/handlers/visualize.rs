//! Trace request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::LanguageInfo;
use crate::trace::Trace;
use crate::web::error::WebError;
use crate::web::state::WebAppState;

/// Body of `POST /visualize`. Both fields are optional so that missing values are reported
/// with the same messages as empty ones.
#[derive(Debug, Default, Deserialize)]
pub struct VisualizeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VisualizeResponse {
    pub trace: Trace,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

/// Trace a program and return its steps.
pub async fn visualize(
    State(state): State<WebAppState>,
    payload: Result<Json<VisualizeRequest>, JsonRejection>,
) -> Result<Json<VisualizeResponse>, WebError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        WebError::BadRequest(e.body_text())
    })?;

    let trace = state
        .core()
        .trace(req.code.as_deref(), req.language.as_deref())
        .await?;

    Ok(Json(VisualizeResponse { trace }))
}

/// List supported languages and whether their tools are installed.
pub async fn list_languages(State(state): State<WebAppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: state.core().languages(),
    })
}
