//! Domain Adapters
//!
//! Implementations of domain ports on top of the repository layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPartnerStore;
//! use domain_partner::PartnerService;
//!
//! let store = PostgresPartnerStore::new(pool);
//! let service = PartnerService::new(Arc::new(store), metadata);
//! ```

pub mod partner;

pub use partner::{PgPartnerTransaction, PostgresPartnerStore};
