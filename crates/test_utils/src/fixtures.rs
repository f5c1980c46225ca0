//! Pre-built Test Fixtures
//!
//! Fixed tenants, groups and tax identifiers. Values are stable so tests can
//! assert on them directly.

use std::sync::Arc;

use core_kernel::{ClientId, GroupId, OrgId, TenantScope, UserId};
use domain_partner::{Group, MockPartnerStore, PartnerService, TenantMetadata};

/// Fixture for tenant data
pub struct TenantFixtures;

impl TenantFixtures {
    pub const CLIENT: ClientId = ClientId::new(11);
    pub const OTHER_CLIENT: ClientId = ClientId::new(12);
    pub const ORG: OrgId = OrgId::new(50);
    pub const ACTOR: UserId = UserId::new(100);

    pub fn scope() -> TenantScope {
        TenantScope::new(Self::CLIENT, Self::ORG)
    }

    /// Metadata for the main test tenant
    pub fn metadata() -> TenantMetadata {
        TenantMetadata::new(Self::scope(), Self::ACTOR)
    }

    /// Metadata for a second tenant, used in isolation tests
    pub fn other_metadata() -> TenantMetadata {
        TenantMetadata::new(TenantScope::new(Self::OTHER_CLIENT, Self::ORG), Self::ACTOR)
    }
}

/// Fixture for partner groups
pub struct GroupFixtures;

impl GroupFixtures {
    pub const STANDARD: GroupId = GroupId::new(103);
    pub const VENDORS: GroupId = GroupId::new(104);
    pub const ARCHIVED: GroupId = GroupId::new(190);

    pub fn standard() -> Group {
        Group {
            id: Self::STANDARD,
            name: "Standard Customers".to_string(),
            description: Some("Default customer group".to_string()),
        }
    }

    pub fn vendors() -> Group {
        Group {
            id: Self::VENDORS,
            name: "Vendors".to_string(),
            description: None,
        }
    }

    /// Exists but is no longer active
    pub fn archived() -> Group {
        Group {
            id: Self::ARCHIVED,
            name: "Archived".to_string(),
            description: None,
        }
    }
}

/// Fixture for tax identifiers
pub struct TaxIdFixtures;

impl TaxIdFixtures {
    /// Natural-person CEDULA
    pub fn cedula() -> &'static str {
        "1710034065"
    }

    /// Same CEDULA with the wrong check digit
    pub fn cedula_bad_check_digit() -> &'static str {
        "1710034066"
    }

    /// Region 99 does not exist
    pub fn cedula_bad_region() -> &'static str {
        "9910034065"
    }

    /// Natural-person RUC: CEDULA plus `001`
    pub fn natural_ruc() -> &'static str {
        "1710034065001"
    }

    pub fn natural_ruc_bad_suffix() -> &'static str {
        "1710034065002"
    }

    /// Private company RUC (third digit 9)
    pub fn private_entity_ruc() -> &'static str {
        "1790011600001"
    }

    /// Public entity RUC (third digit 6)
    pub fn public_entity_ruc() -> &'static str {
        "1760000070001"
    }

    pub fn too_short() -> &'static str {
        "123"
    }
}

/// In-memory store with the standard and vendor groups active for the main
/// tenant and the archived group inactive
pub fn seeded_mock_store() -> MockPartnerStore {
    MockPartnerStore::new()
        .with_group(TenantFixtures::CLIENT, GroupFixtures::standard())
        .with_group(TenantFixtures::CLIENT, GroupFixtures::vendors())
        .with_inactive_group(TenantFixtures::CLIENT, GroupFixtures::archived())
        .with_group(TenantFixtures::OTHER_CLIENT, GroupFixtures::standard())
}

/// Service over [`seeded_mock_store`] for the main tenant, without retry delays
pub fn mock_partner_service() -> PartnerService<MockPartnerStore> {
    PartnerService::new(Arc::new(seeded_mock_store()), TenantFixtures::metadata())
        .with_retry_backoff(std::time::Duration::ZERO)
}
