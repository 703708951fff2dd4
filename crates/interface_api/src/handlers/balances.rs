//! Balance summary handlers

use axum::{extract::{Query, State}, Json};
use domain_payables::BalanceSummary;

use crate::{AppState, error::ApiError};
use crate::dto::balance::BalancesQuery;

pub async fn get_balances(
    State(state): State<AppState>,
    Query(query): Query<BalancesQuery>,
) -> Result<Json<BalanceSummary>, ApiError> {
    let scope = query.into_scope()?;
    let summary = state.engine.aggregate_balances(scope).await?;
    Ok(Json(summary))
}
