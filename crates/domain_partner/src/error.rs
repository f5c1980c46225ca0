//! Partner domain errors
//!
//! Every rejected creation ends in one of these values. Storage faults are
//! remapped into this taxonomy before they leave the service.

use thiserror::Error;

use core_kernel::GroupId;

use crate::tax_id::{TaxIdFailure, TaxIdKind};

/// Errors that can occur while creating a business partner
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreationError {
    /// One or more required draft fields were blank
    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingField { fields: Vec<&'static str> },

    /// Tax identifier failed classification or checksum
    #[error("Invalid tax identifier: {message}")]
    InvalidTaxId {
        attempted: Option<TaxIdKind>,
        failure: TaxIdFailure,
        message: String,
    },

    /// Group does not exist for the tenant
    #[error("Unknown partner group: {group_id}")]
    InvalidGroup { group_id: GroupId },

    /// Another partner in the tenant already uses this code
    #[error("Partner code '{code}' already exists")]
    DuplicateCode { code: String },

    /// Every allocation attempt collided with a concurrent insert
    #[error("Could not allocate a partner identifier after {attempts} attempts")]
    AllocationContention { attempts: u32 },

    /// No identifier left in the configured range
    #[error("Partner identifier range {start}-{end} is exhausted")]
    IdRangeExhausted { start: i32, end: i32 },

    /// Any other storage failure; the transaction was rolled back
    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl CreationError {
    /// Creates a Persistence error with a message
    pub fn persistence(message: impl Into<String>) -> Self {
        CreationError::Persistence(message.into())
    }

    /// Whether a caller may reasonably resubmit the same draft later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CreationError::AllocationContention { .. } | CreationError::Persistence(_)
        )
    }

    /// Whether the draft itself was at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CreationError::MissingField { .. }
                | CreationError::InvalidTaxId { .. }
                | CreationError::InvalidGroup { .. }
                | CreationError::DuplicateCode { .. }
        )
    }
}
