//! Test Utilities Crate
//!
//! Shared test infrastructure for the business partner workspace.
//!
//! # Modules
//!
//! - `fixtures`: fixed tenants, groups and tax identifiers
//! - `builders`: draft and record builders with sensible defaults
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: assertion helpers for validation and creation results
//! - `generators`: proptest strategies and `fake`-based data

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
