//! Cross-entity liability handlers

use axum::{extract::{Path, State}, Json};
use core_kernel::InvoiceId;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use crate::dto::liability::{change_response, LiabilityResponse};

/// Computes an invoice's liability without persisting it
pub async fn preview_liability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiabilityResponse>, ApiError> {
    let preview = state
        .engine
        .preview_invoice_liability(InvoiceId::from_uuid(id))
        .await?;
    Ok(Json(preview.into()))
}

/// Recomputes an invoice's liability and persists the change
pub async fn sync_liability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiabilityResponse>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);
    let change = state.engine.sync_invoice_liability(invoice_id).await?;
    Ok(Json(change_response(invoice_id, &change)))
}
