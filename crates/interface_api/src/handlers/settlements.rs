//! Settlement handlers

use axum::{extract::State, http::StatusCode, Json};
use domain_payables::{Allocation, SettlementPayment};
use validator::Validate;

use crate::{AppState, error::ApiError};
use crate::dto::settlement::CreateSettlementRequest;

/// Allocates and records an inter-company settlement
pub async fn create_settlement(
    State(state): State<AppState>,
    Json(body): Json<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<SettlementPayment>), ApiError> {
    body.validate()?;
    let request = body.into_request()?;
    let settlement = state.engine.allocate_settlement(&request).await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}

/// Shows how a settlement would be allocated
pub async fn preview_settlement(
    State(state): State<AppState>,
    Json(body): Json<CreateSettlementRequest>,
) -> Result<Json<Allocation>, ApiError> {
    body.validate()?;
    let request = body.into_request()?;
    let allocation = state.engine.preview_settlement(&request).await?;
    Ok(Json(allocation))
}
