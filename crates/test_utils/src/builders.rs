//! Test Data Builders
//!
//! Builders let a test name only the fields it cares about.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{GroupId, PartnerId};
use domain_partner::{BusinessPartnerDraft, BusinessPartnerRecord, TaxIdentifier, TenantMetadata};

use crate::fixtures::{GroupFixtures, TaxIdFixtures, TenantFixtures};

/// Builder for creation drafts
#[derive(Debug, Clone)]
pub struct PartnerDraftBuilder {
    code: String,
    name: String,
    tax_id: String,
    group_id: Option<GroupId>,
}

impl Default for PartnerDraftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PartnerDraftBuilder {
    /// A complete draft: `CLIE001`, "Juan Perez", a valid CEDULA, standard group
    pub fn new() -> Self {
        Self {
            code: "CLIE001".to_string(),
            name: "Juan Perez".to_string(),
            tax_id: TaxIdFixtures::cedula().to_string(),
            group_id: Some(GroupFixtures::STANDARD),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = tax_id.into();
        self
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn without_group(mut self) -> Self {
        self.group_id = None;
        self
    }

    pub fn build(self) -> BusinessPartnerDraft {
        BusinessPartnerDraft {
            code: self.code,
            name: self.name,
            tax_id: self.tax_id,
            group_id: self.group_id,
        }
    }
}

/// Builder for already-persisted records, used to seed stores
#[derive(Debug, Clone)]
pub struct PartnerRecordBuilder {
    id: PartnerId,
    code: String,
    name: String,
    tax_id: String,
    group_id: GroupId,
    metadata: TenantMetadata,
    created_at: DateTime<Utc>,
}

impl PartnerRecordBuilder {
    /// A record for the main tenant with the given identifier
    pub fn new(id: i32) -> Self {
        Self {
            id: PartnerId::new(id),
            code: format!("SEED{}", id),
            name: format!("Seeded Partner {}", id),
            tax_id: TaxIdFixtures::natural_ruc().to_string(),
            group_id: GroupFixtures::STANDARD,
            metadata: TenantFixtures::metadata(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or_default(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = tax_id.into();
        self
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn for_tenant(mut self, metadata: TenantMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> BusinessPartnerRecord {
        BusinessPartnerRecord::assemble(
            self.id,
            &self.code,
            &self.name,
            TaxIdentifier::new(self.tax_id),
            self.group_id,
            &self.metadata,
            self.created_at,
        )
    }
}
