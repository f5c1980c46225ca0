//! Business partner repository
//!
//! Tables `c_bpartner` and `c_bp_group`, both keyed by `ad_client_id` first.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use crate::error::DatabaseError;

/// First key of the two-key advisory lock taken per tenant; the second key is
/// the client id. `0x4250` spells "BP".
pub const PARTNER_LOCK_NAMESPACE: i32 = 0x4250;

/// Repository for business partners and partner groups
#[derive(Debug, Clone)]
pub struct PartnerRepository {
    pool: PgPool,
}

impl PartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Active partners of a client joined with their group name
    ///
    /// `pattern` is a ready-made `LIKE` pattern in upper case; it is matched
    /// against the upper-cased name and the raw tax identifier.
    pub async fn list_active(
        &self,
        client_id: i32,
        pattern: Option<&str>,
    ) -> Result<Vec<PartnerSummaryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PartnerSummaryRow>(
            r#"
            SELECT
                bp.c_bpartner_id,
                bp.value,
                bp.name,
                bp.taxid,
                bg.name AS group_name
            FROM c_bpartner bp
            LEFT JOIN c_bp_group bg
                ON bg.ad_client_id = bp.ad_client_id
               AND bg.c_bp_group_id = bp.c_bp_group_id
            WHERE bp.ad_client_id = $1
              AND bp.is_active
              AND ($2::text IS NULL OR upper(bp.name) LIKE $2 OR bp.taxid LIKE $2)
            ORDER BY bp.name ASC
            "#,
        )
        .bind(client_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active groups of a client ordered by name
    pub async fn list_active_groups(&self, client_id: i32) -> Result<Vec<GroupRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT c_bp_group_id, name, description
            FROM c_bp_group
            WHERE ad_client_id = $1 AND is_active
            ORDER BY name ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Round-trips a trivial query
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// Blocks until no other transaction holds the client's partner lock
    ///
    /// The lock is released automatically at commit or rollback.
    pub async fn lock_client(conn: &mut PgConnection, client_id: i32) -> Result<(), DatabaseError> {
        debug!(client_id, "Acquiring partner allocation lock");
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(PARTNER_LOCK_NAMESPACE)
            .bind(client_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Largest partner id of a client inside `[start, end]`
    pub async fn max_id_in_range(
        conn: &mut PgConnection,
        client_id: i32,
        start: i32,
        end: i32,
    ) -> Result<Option<i32>, DatabaseError> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(c_bpartner_id)
            FROM c_bpartner
            WHERE ad_client_id = $1
              AND c_bpartner_id BETWEEN $2 AND $3
            "#,
        )
        .bind(client_id)
        .bind(start)
        .bind(end)
        .fetch_one(conn)
        .await?;

        Ok(max)
    }

    /// Inserts one partner row
    pub async fn insert(conn: &mut PgConnection, partner: &NewPartner) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO c_bpartner (
                c_bpartner_id, ad_client_id, ad_org_id,
                value, name, taxid, c_bp_group_id,
                is_active, is_summary, is_one_time, is_prospect,
                is_vendor, is_employee, is_sales_rep, is_customer,
                created, created_by, updated, updated_by
            ) VALUES (
                $1, $2, $3,
                $4, $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13, $14, $15,
                $16, $17, $18, $19
            )
            "#,
        )
        .bind(partner.c_bpartner_id)
        .bind(partner.ad_client_id)
        .bind(partner.ad_org_id)
        .bind(&partner.value)
        .bind(&partner.name)
        .bind(&partner.taxid)
        .bind(partner.c_bp_group_id)
        .bind(partner.is_active)
        .bind(partner.is_summary)
        .bind(partner.is_one_time)
        .bind(partner.is_prospect)
        .bind(partner.is_vendor)
        .bind(partner.is_employee)
        .bind(partner.is_sales_rep)
        .bind(partner.is_customer)
        .bind(partner.created)
        .bind(partner.created_by)
        .bind(partner.updated)
        .bind(partner.updated_by)
        .execute(conn)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

/// Row of the partner listing
#[derive(Debug, Clone, FromRow)]
pub struct PartnerSummaryRow {
    pub c_bpartner_id: i32,
    pub value: String,
    pub name: String,
    pub taxid: String,
    pub group_name: Option<String>,
}

/// Row of `c_bp_group`
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub c_bp_group_id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Data for inserting a partner
#[derive(Debug, Clone)]
pub struct NewPartner {
    pub c_bpartner_id: i32,
    pub ad_client_id: i32,
    pub ad_org_id: i32,
    pub value: String,
    pub name: String,
    pub taxid: String,
    pub c_bp_group_id: i32,
    pub is_active: bool,
    pub is_summary: bool,
    pub is_one_time: bool,
    pub is_prospect: bool,
    pub is_vendor: bool,
    pub is_employee: bool,
    pub is_sales_rep: bool,
    pub is_customer: bool,
    pub created: DateTime<Utc>,
    pub created_by: i32,
    pub updated: DateTime<Utc>,
    pub updated_by: i32,
}
