use crate::domain::entities::{SweepKind, SweepOutcome};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    Json,
};

/// Runs one recovery sweep on demand, subject to the same toggles as the scheduler.
pub async fn run_sweep(
    State(state): State<AppState>,
    Path(sweep): Path<String>,
) -> ApiResult<Json<SweepOutcome>> {
    let kind: SweepKind = sweep
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown sweep: {}", sweep)))?;

    let outcome = state.recovery_service.run_sweep(kind).await?;
    Ok(Json(outcome))
}
