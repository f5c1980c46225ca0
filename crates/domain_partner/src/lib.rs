//! Business Partner Domain
//!
//! This crate owns the rules for creating business partner records:
//!
//! - **Tax identifier validation**: CEDULA (10 digits) and RUC (13 digits)
//!   classification with their check-digit algorithms
//! - **Identifier allocation**: the next free partner id inside a closed range
//!   per tenant
//! - **Creation flow**: validation, allocation and insert in one transaction,
//!   with a bounded retry when a concurrent flow takes the same id
//!
//! Storage is reached through the [`PartnerStore`] port only.
//!
//! # Examples
//!
//! ```rust
//! use domain_partner::tax_id::{classify_and_validate, TaxIdKind};
//!
//! let cedula = classify_and_validate("1710034065");
//! assert_eq!(cedula.kind, Some(TaxIdKind::Cedula));
//!
//! let ruc = classify_and_validate("1710034065001");
//! assert_eq!(ruc.kind, Some(TaxIdKind::Ruc));
//! ```

pub mod tax_id;
pub mod partner;
pub mod allocator;
pub mod ports;
pub mod service;
pub mod error;

pub use tax_id::{
    classify_and_validate, TaxIdFailure, TaxIdKind, TaxIdValidation, TaxIdentifier,
};
pub use partner::{
    BusinessPartnerDraft, BusinessPartnerRecord, CreatedPartner, Group, PartnerFlags,
    PartnerSummary, TenantMetadata,
};
pub use allocator::{AllocationError, IdRange, SequentialIdAllocator};
pub use ports::{
    ConstraintKind, PartnerQuery, PartnerStore, PartnerTransaction, StorageError, UniqueTarget,
};
pub use service::{PartnerService, DEFAULT_MAX_ATTEMPTS};
pub use error::CreationError;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockPartnerStore;
