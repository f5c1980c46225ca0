//! Infrastructure Database Layer
//!
//! PostgreSQL storage for business partners using SQLx.
//!
//! # Architecture
//!
//! - [`pool`]: connection pool configuration and lifecycle
//! - [`repositories::PartnerRepository`]: the SQL, row types and tenant lock
//! - [`adapters::PostgresPartnerStore`]: implements the `PartnerStore` port of
//!   `domain_partner` on top of the repository
//!
//! Queries are bound at runtime (`sqlx::query_as::<_, Row>`), so building the
//! crate does not need a live database.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresPartnerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/erp")).await?;
//! let store = PostgresPartnerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{close_pool, create_pool, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::PartnerRepository;
pub use adapters::{PgPartnerTransaction, PostgresPartnerStore};

/// Schema migrations shipped with the crate
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
