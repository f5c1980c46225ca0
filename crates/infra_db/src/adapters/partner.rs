//! PostgreSQL Partner Store
//!
//! Implements the `PartnerStore` and `PartnerTransaction` ports of
//! `domain_partner`. Each creation attempt gets its own
//! `sqlx::Transaction`; dropping it without commit rolls back.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ClientId, DomainPort, GroupId, HealthCheckResult, HealthCheckable, PartnerId,
};
use domain_partner::{
    BusinessPartnerRecord, Group, IdRange, PartnerQuery, PartnerStore, PartnerSummary,
    PartnerTransaction, StorageError,
};

use crate::error::DatabaseError;
use crate::repositories::partner::{GroupRow, NewPartner, PartnerRepository, PartnerSummaryRow};

const ADAPTER_ID: &str = "postgres-partner-store";

/// PostgreSQL-backed implementation of [`PartnerStore`]
#[derive(Debug, Clone)]
pub struct PostgresPartnerStore {
    repository: PartnerRepository,
}

impl PostgresPartnerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PartnerRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &PartnerRepository {
        &self.repository
    }
}

impl DomainPort for PostgresPartnerStore {}

#[async_trait]
impl HealthCheckable for PostgresPartnerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PartnerStore for PostgresPartnerStore {
    type Tx = PgPartnerTransaction;

    async fn begin(&self) -> Result<PgPartnerTransaction, StorageError> {
        let tx = self
            .repository
            .pool()
            .begin()
            .await
            .map_err(DatabaseError::from)?;
        Ok(PgPartnerTransaction { tx })
    }

    #[instrument(skip(self, query), fields(client_id = client.value()))]
    async fn list_partners(
        &self,
        client: ClientId,
        query: &PartnerQuery,
    ) -> Result<Vec<PartnerSummary>, StorageError> {
        let pattern = query.like_pattern();
        let rows = self
            .repository
            .list_active(client.value(), pattern.as_deref())
            .await?;
        debug!(count = rows.len(), "Listed partners");
        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    async fn list_active_groups(&self, client: ClientId) -> Result<Vec<Group>, StorageError> {
        let rows = self.repository.list_active_groups(client.value()).await?;
        Ok(rows.into_iter().map(group_from_row).collect())
    }
}

/// One creation attempt's transaction
pub struct PgPartnerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PartnerTransaction for PgPartnerTransaction {
    async fn lock_scope(&mut self, client: ClientId) -> Result<(), StorageError> {
        PartnerRepository::lock_client(&mut self.tx, client.value()).await?;
        Ok(())
    }

    async fn query_max_id(
        &mut self,
        client: ClientId,
        range: IdRange,
    ) -> Result<Option<PartnerId>, StorageError> {
        let max = PartnerRepository::max_id_in_range(
            &mut self.tx,
            client.value(),
            range.start(),
            range.end(),
        )
        .await?;
        Ok(max.map(PartnerId::new))
    }

    #[instrument(skip(self, record), fields(partner_id = record.id.value(), code = %record.code))]
    async fn insert_partner(&mut self, record: &BusinessPartnerRecord) -> Result<(), StorageError> {
        PartnerRepository::insert(&mut self.tx, &new_partner(record)).await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn new_partner(record: &BusinessPartnerRecord) -> NewPartner {
    let flags = record.flags;
    NewPartner {
        c_bpartner_id: record.id.value(),
        ad_client_id: record.client_id.value(),
        ad_org_id: record.org_id.value(),
        value: record.code.clone(),
        name: record.name.clone(),
        taxid: record.tax_id.as_str().to_string(),
        c_bp_group_id: record.group_id.value(),
        is_active: flags.is_active,
        is_summary: flags.is_summary,
        is_one_time: flags.is_one_time,
        is_prospect: flags.is_prospect,
        is_vendor: flags.is_vendor,
        is_employee: flags.is_employee,
        is_sales_rep: flags.is_sales_rep,
        is_customer: flags.is_customer,
        created: record.created_at,
        created_by: record.created_by.value(),
        updated: record.updated_at,
        updated_by: record.updated_by.value(),
    }
}

fn summary_from_row(row: PartnerSummaryRow) -> PartnerSummary {
    PartnerSummary {
        id: PartnerId::new(row.c_bpartner_id),
        code: row.value,
        name: row.name,
        tax_id: row.taxid,
        group_name: row.group_name,
    }
}

fn group_from_row(row: GroupRow) -> Group {
    Group {
        id: GroupId::new(row.c_bp_group_id),
        name: row.name,
        description: row.description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{OrgId, TenantScope, UserId};
    use domain_partner::{TaxIdentifier, TenantMetadata};

    #[test]
    fn test_record_maps_to_insert_row() {
        let metadata = TenantMetadata::new(
            TenantScope::new(ClientId::new(11), OrgId::new(50)),
            UserId::new(100),
        );
        let record = BusinessPartnerRecord::assemble(
            PartnerId::new(1000),
            " CLIE001 ",
            "Juan Perez",
            TaxIdentifier::new("1710034065"),
            GroupId::new(103),
            &metadata,
            Utc::now(),
        );

        let row = new_partner(&record);

        assert_eq!(row.c_bpartner_id, 1000);
        assert_eq!(row.ad_client_id, 11);
        assert_eq!(row.ad_org_id, 50);
        assert_eq!(row.value, "CLIE001");
        assert_eq!(row.taxid, "1710034065");
        assert!(row.is_customer && row.is_active && !row.is_vendor);
        assert_eq!(row.created_by, 100);
    }

    #[test]
    fn test_summary_row_keeps_missing_group_name() {
        let summary = summary_from_row(PartnerSummaryRow {
            c_bpartner_id: 1001,
            value: "CLIE002".to_string(),
            name: "Ana Torres".to_string(),
            taxid: "1710034065001".to_string(),
            group_name: None,
        });
        assert_eq!(summary.id, PartnerId::new(1001));
        assert!(summary.group_name.is_none());
    }
}
