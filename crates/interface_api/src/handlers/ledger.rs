//! Vendor ledger handlers

use axum::{extract::{Path, Query, State}, Json};
use core_kernel::VendorId;
use domain_payables::VendorLedgerView;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use crate::dto::ledger::LedgerQuery;

/// Vendor ledger with running balances
pub async fn get_vendor_ledger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<VendorLedgerView>, ApiError> {
    let filter = query.into_filter()?;
    let view = state
        .engine
        .build_vendor_ledger(VendorId::from_uuid(id), filter)
        .await?;
    Ok(Json(view))
}
