use crate::domain::entities::{Lead, LeadStatus};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<ListLeadsQuery>,
) -> ApiResult<Json<Vec<Lead>>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            LeadStatus::from_str(raw)
                .map_err(|_| ApiError::BadRequest(format!("Unknown lead status: {}", raw)))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let leads = state.lead_repo.list_leads(status, limit).await?;
    Ok(Json(leads))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lead>> {
    let lead = state.lifecycle_service.get_lead(&id).await?;
    Ok(Json(lead))
}
