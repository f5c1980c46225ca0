//! Business partner model
//!
//! A partner starts life as a [`BusinessPartnerDraft`] submitted by a caller.
//! Once validated and assigned an identifier it becomes a
//! [`BusinessPartnerRecord`], which is written once and never changed by this
//! crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, GroupId, OrgId, PartnerId, TenantScope, UserId};

use crate::tax_id::{TaxIdKind, TaxIdentifier};

/// Partner data as submitted, before validation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessPartnerDraft {
    /// Search key, unique per tenant
    pub code: String,
    /// Display name
    pub name: String,
    /// CEDULA or RUC
    pub tax_id: String,
    /// Partner group, must reference an existing group
    pub group_id: Option<GroupId>,
}

impl BusinessPartnerDraft {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        tax_id: impl Into<String>,
        group_id: GroupId,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            tax_id: tax_id.into(),
            group_id: Some(group_id),
        }
    }

    /// Names of the fields that are blank or absent, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.code.trim().is_empty() {
            missing.push("code");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.tax_id.trim().is_empty() {
            missing.push("tax_id");
        }
        if self.group_id.is_none() {
            missing.push("group_id");
        }
        missing
    }
}

/// Role and lifecycle flags stored with every partner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerFlags {
    pub is_active: bool,
    pub is_summary: bool,
    pub is_one_time: bool,
    pub is_prospect: bool,
    pub is_vendor: bool,
    pub is_employee: bool,
    pub is_sales_rep: bool,
    pub is_customer: bool,
}

impl Default for PartnerFlags {
    /// An active, regular customer
    fn default() -> Self {
        Self {
            is_active: true,
            is_summary: false,
            is_one_time: false,
            is_prospect: false,
            is_vendor: false,
            is_employee: false,
            is_sales_rep: false,
            is_customer: true,
        }
    }
}

/// Tenant and actor a record is written under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    pub scope: TenantScope,
    pub created_by: UserId,
    pub updated_by: UserId,
}

impl TenantMetadata {
    /// Metadata where the same user creates and last updates the row
    pub fn new(scope: TenantScope, actor: UserId) -> Self {
        Self {
            scope,
            created_by: actor,
            updated_by: actor,
        }
    }
}

/// A persisted business partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessPartnerRecord {
    pub id: PartnerId,
    pub client_id: ClientId,
    pub org_id: OrgId,
    pub code: String,
    pub name: String,
    pub tax_id: TaxIdentifier,
    pub group_id: GroupId,
    pub flags: PartnerFlags,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

impl BusinessPartnerRecord {
    /// Builds the row to insert for a validated draft
    pub fn assemble(
        id: PartnerId,
        code: &str,
        name: &str,
        tax_id: TaxIdentifier,
        group_id: GroupId,
        metadata: &TenantMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client_id: metadata.scope.client,
            org_id: metadata.scope.org,
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            tax_id,
            group_id,
            flags: PartnerFlags::default(),
            created_by: metadata.created_by,
            created_at: now,
            updated_by: metadata.updated_by,
            updated_at: now,
        }
    }
}

/// Result of a successful creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPartner {
    pub record: BusinessPartnerRecord,
    pub tax_id_kind: TaxIdKind,
    pub tax_id_message: String,
}

/// Partner group reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
}

/// Row of the partner listing, joined with its group name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub id: PartnerId,
    pub code: String,
    pub name: String,
    pub tax_id: String,
    pub group_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_reports_each_blank_field() {
        let draft = BusinessPartnerDraft {
            code: "  ".to_string(),
            name: "Juan Perez".to_string(),
            tax_id: String::new(),
            group_id: None,
        };
        assert_eq!(draft.missing_fields(), vec!["code", "tax_id", "group_id"]);
    }

    #[test]
    fn test_complete_draft_has_no_missing_fields() {
        let draft = BusinessPartnerDraft::new("CLIE001", "Juan Perez", "1710034065", GroupId::new(1));
        assert!(draft.missing_fields().is_empty());
    }

    #[test]
    fn test_default_flags_describe_active_customer() {
        let flags = PartnerFlags::default();
        assert!(flags.is_active && flags.is_customer);
        assert!(!flags.is_vendor && !flags.is_employee && !flags.is_sales_rep);
        assert!(!flags.is_one_time && !flags.is_summary && !flags.is_prospect);
    }

    #[test]
    fn test_assemble_trims_and_scopes() {
        let metadata = TenantMetadata::new(TenantScope::new(11, 50), UserId::new(100));
        let now = Utc::now();
        let record = BusinessPartnerRecord::assemble(
            PartnerId::new(1000),
            " CLIE001 ",
            " Juan Perez",
            TaxIdentifier::new("1710034065"),
            GroupId::new(103),
            &metadata,
            now,
        );

        assert_eq!(record.code, "CLIE001");
        assert_eq!(record.name, "Juan Perez");
        assert_eq!(record.client_id, ClientId::new(11));
        assert_eq!(record.org_id, OrgId::new(50));
        assert_eq!(record.created_at, record.updated_at);
    }
}
