use axum::{Json, Router, extract::State, middleware, routing::post};
use validator::Validate;

use crate::{
    consts::analysis_const::MIN_ANALYSIS_CHARS,
    errors::Result,
    middleware::require_actor,
    models::analysis::DriverReport,
    state::AppState,
    utils::validated_form::ValidatedJson,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/scan", post(scan_text))
        .layer(middleware::from_fn_with_state(state.clone(), require_actor))
        .with_state(state)
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct ScanRequest {
    #[validate(length(
        min = MIN_ANALYSIS_CHARS,
        message = "Please enter at least 20 characters for a meaningful analysis."
    ))]
    pub text: String,
}

/// The length check runs in the extractor, so short inputs never reach the
/// analyzer.
pub async fn scan_text(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ScanRequest>,
) -> Result<Json<DriverReport>> {
    let report = state.analyzer.analyze(&input.text).await?;
    Ok(Json(report))
}
