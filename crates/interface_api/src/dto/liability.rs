//! Liability DTOs

use core_kernel::{InvoiceId, Money};
use domain_payables::{CrossEntityLiability, LegalEntity, LiabilityChange, LiabilityPreview};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LiabilityResponse {
    pub invoice_id: InvoiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<&'static str>,
    pub liability: Option<CrossEntityLiability>,
    /// Who owes whom once the sign of the amount is applied
    pub effective_payer: Option<LegalEntity>,
    pub effective_receiver: Option<LegalEntity>,
}

impl LiabilityResponse {
    fn new(invoice_id: InvoiceId, liability: Option<CrossEntityLiability>) -> Self {
        Self {
            invoice_id,
            net_amount: None,
            change: None,
            effective_payer: liability.as_ref().map(|l| l.effective_payer()),
            effective_receiver: liability.as_ref().map(|l| l.effective_receiver()),
            liability,
        }
    }
}

impl From<LiabilityPreview> for LiabilityResponse {
    fn from(preview: LiabilityPreview) -> Self {
        Self {
            net_amount: Some(preview.net_amount),
            ..Self::new(preview.invoice.id, preview.liability)
        }
    }
}

/// Describes a persisted change; a cancelled liability is still returned
pub fn change_response(invoice_id: InvoiceId, change: &LiabilityChange) -> LiabilityResponse {
    let (kind, liability) = match change {
        LiabilityChange::Noop => ("noop", None),
        LiabilityChange::Insert(l) => ("insert", Some(l)),
        LiabilityChange::Unchanged(l) => ("unchanged", Some(l)),
        LiabilityChange::Replace { next, .. } => ("replace", Some(next)),
        LiabilityChange::Cancel(l) => ("cancel", Some(l)),
    };
    LiabilityResponse {
        change: Some(kind),
        ..LiabilityResponse::new(invoice_id, liability.cloned())
    }
}
