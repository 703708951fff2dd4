//! Payables domain errors

use std::fmt;

use core_kernel::{MoneyError, PortError};
use thiserror::Error;

use crate::entity::LegalEntity;

/// Errors that can occur in the payables domain
///
/// Every variant names the offending identifiers so callers can surface a
/// structured result without parsing messages.
#[derive(Debug, Error)]
pub enum PayablesError {
    /// Split shares or VAT rate are invalid; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A source document cannot be processed as recorded
    #[error("Data integrity error on {document_id}: {reason}")]
    DataIntegrity {
        document_id: String,
        reason: String,
    },

    /// Concurrent settlements kept invalidating the outstanding snapshot
    #[error("Allocation conflict for {payer} -> {receiver} after {attempts} attempts")]
    AllocationConflict {
        payer: LegalEntity,
        receiver: LegalEntity,
        attempts: u32,
    },

    /// Unknown vendor, invoice or liability
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A request argument is invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Monetary arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// The persistence boundary failed
    #[error("Port error: {0}")]
    Port(PortError),
}

impl PayablesError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PayablesError::Configuration(message.into())
    }

    pub fn data_integrity(document_id: impl fmt::Display, reason: impl Into<String>) -> Self {
        PayablesError::DataIntegrity {
            document_id: document_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PayablesError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PayablesError::Validation(message.into())
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PayablesError::Configuration(_) => "configuration",
            PayablesError::DataIntegrity { .. } => "data_integrity",
            PayablesError::AllocationConflict { .. } => "allocation_conflict",
            PayablesError::NotFound { .. } => "not_found",
            PayablesError::Validation(_) => "validation",
            PayablesError::Money(_) => "money",
            PayablesError::Port(_) => "port",
        }
    }
}

impl From<PortError> for PayablesError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => PayablesError::NotFound { entity_type, id },
            other => PayablesError::Port(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_maps_to_domain_not_found() {
        let error: PayablesError = PortError::not_found("Vendor", "VND-1").into();
        assert!(matches!(error, PayablesError::NotFound { ref entity_type, .. } if entity_type == "Vendor"));
        assert_eq!(error.kind(), "not_found");
    }

    #[test]
    fn test_data_integrity_names_document() {
        let error = PayablesError::data_integrity("INV-9", "payments exceed gross amount");
        assert_eq!(
            error.to_string(),
            "Data integrity error on INV-9: payments exceed gross amount"
        );
    }
}
