use crate::domain::entities::Professional;
use crate::infrastructure::http::middleware::{ApiResult, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListProfessionalsQuery {
    pub keyword: Option<String>,
}

/// Active professionals, optionally narrowed to one service keyword.
pub async fn list_professionals(
    State(state): State<AppState>,
    Query(query): Query<ListProfessionalsQuery>,
) -> ApiResult<Json<Vec<Professional>>> {
    let professionals = match query.keyword.as_deref().map(str::trim) {
        Some(keyword) if !keyword.is_empty() => {
            state.professional_repo.list_active_by_keyword(keyword).await?
        }
        _ => state.professional_repo.list_active_professionals().await?,
    };
    Ok(Json(professionals))
}
