//! Core Kernel - Foundational types shared by the business partner system
//!
//! This crate provides the building blocks used across the workspace:
//! - Integer identifiers for tenants, organizations, partners, groups and users
//! - The tenant scope every partner operation is partitioned by
//! - Port marker traits and operation metadata for the hexagonal layout

pub mod identifiers;
pub mod error;
pub mod ports;

pub use identifiers::{ClientId, OrgId, PartnerId, GroupId, UserId, TenantScope};
pub use error::CoreError;
pub use ports::{
    DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth, OperationMetadata,
};
