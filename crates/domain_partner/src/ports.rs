//! Partner Domain Ports
//!
//! This module defines the storage boundary the partner domain consumes.
//!
//! # Architecture
//!
//! - [`PartnerStore`] opens transactions and serves the read-only listings
//! - [`PartnerTransaction`] is the handle the creation flow works through:
//!   tenant lock, max-id query, insert, then commit or rollback
//!
//! Adapters:
//!
//! - **PostgreSQL**: `infra_db::adapters::PostgresPartnerStore`
//! - **In-memory**: [`mock::MockPartnerStore`] (feature `mock`)
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! tx.lock_scope(client).await?;
//! let max = tx.query_max_id(client, IdRange::DEFAULT).await?;
//! tx.insert_partner(&record).await?;
//! tx.commit().await?;
//! ```

use async_trait::async_trait;
use thiserror::Error;

use core_kernel::{ClientId, DomainPort, HealthCheckable, PartnerId};

use crate::allocator::IdRange;
use crate::partner::{BusinessPartnerRecord, Group, PartnerSummary};

/// Which unique constraint an insert violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueTarget {
    /// `(client, id)`: another flow took the same identifier
    Identifier,
    /// `(client, code)`: the partner code is already used
    Code,
}

/// Kind of integrity constraint reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique(UniqueTarget),
    ForeignKey,
}

/// Error type for partner storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// An integrity constraint rejected the write
    #[error("Constraint violation ({kind:?}): {message}")]
    ConstraintViolation { kind: ConstraintKind, message: String },

    /// The transaction lost a serialization race or deadlocked
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or no connection was available
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn unique(target: UniqueTarget, message: impl Into<String>) -> Self {
        StorageError::ConstraintViolation {
            kind: ConstraintKind::Unique(target),
            message: message.into(),
        }
    }

    pub fn foreign_key(message: impl Into<String>) -> Self {
        StorageError::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        StorageError::Backend(message.into())
    }

    /// Returns true if the same operation may succeed on a fresh transaction
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Conflict(_) | StorageError::Unavailable(_))
    }

    /// Returns the violated constraint, if any
    pub fn constraint(&self) -> Option<ConstraintKind> {
        match self {
            StorageError::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Filter for the partner listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerQuery {
    /// Case-insensitive fragment of the name or tax identifier
    pub search: Option<String>,
}

impl PartnerQuery {
    /// Creates a query matching a name or tax id fragment
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }

    /// Upper-cased trimmed search term, `None` when blank
    pub fn normalized_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_uppercase)
    }

    /// SQL `LIKE` pattern for the term
    pub fn like_pattern(&self) -> Option<String> {
        self.normalized_term().map(|term| format!("%{}%", term))
    }
}

/// Store of business partners
///
/// Implementations own their connection handling; the domain only ever
/// receives a store instance and asks it for transactions.
#[async_trait]
pub trait PartnerStore: DomainPort + HealthCheckable {
    /// Transaction handle type
    type Tx: PartnerTransaction;

    /// Begins a transaction for one creation attempt
    async fn begin(&self) -> Result<Self::Tx, StorageError>;

    /// Active partners of a tenant, ordered by name
    async fn list_partners(
        &self,
        client: ClientId,
        query: &PartnerQuery,
    ) -> Result<Vec<PartnerSummary>, StorageError>;

    /// Active partner groups of a tenant, ordered by name
    async fn list_active_groups(&self, client: ClientId) -> Result<Vec<Group>, StorageError>;
}

/// One open storage transaction
///
/// Dropping a handle without calling [`commit`](PartnerTransaction::commit)
/// must discard every write made through it.
#[async_trait]
pub trait PartnerTransaction: Send {
    /// Serializes creation flows of a tenant until this transaction ends
    async fn lock_scope(&mut self, client: ClientId) -> Result<(), StorageError>;

    /// Largest identifier in `range` used by the tenant
    async fn query_max_id(
        &mut self,
        client: ClientId,
        range: IdRange,
    ) -> Result<Option<PartnerId>, StorageError>;

    /// Inserts a record; tenant and creation metadata travel on the record
    async fn insert_partner(&mut self, record: &BusinessPartnerRecord) -> Result<(), StorageError>;

    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}

/// In-memory store for tests and local development
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard};

    use chrono::Utc;
    use tokio::sync::OwnedMutexGuard;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Clone)]
    struct StoredPartner {
        record: BusinessPartnerRecord,
        /// Transaction that wrote the row, `None` once committed
        pending_in: Option<u64>,
    }

    #[derive(Debug, Default)]
    struct MockState {
        partners: Vec<StoredPartner>,
        groups: HashMap<ClientId, Vec<(Group, bool)>>,
        next_tx: u64,
        injected_id_collisions: u32,
        injected_insert_failure: Option<String>,
        unavailable: bool,
        commits: u32,
        rollbacks: u32,
    }

    impl MockState {
        fn discard(&mut self, tx_id: u64) {
            self.partners.retain(|p| p.pending_in != Some(tx_id));
        }
    }

    fn lock_state(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// In-memory implementation of [`PartnerStore`]
    ///
    /// Writes become visible to other transactions as soon as they are made,
    /// so unique violations surface at insert time like they do on a real
    /// database. Scope locking can be switched off to exercise the retry path;
    /// the store then yields after reading the max so concurrent flows race.
    #[derive(Debug, Clone)]
    pub struct MockPartnerStore {
        state: Arc<Mutex<MockState>>,
        scope_locks: Arc<Mutex<HashMap<ClientId, Arc<tokio::sync::Mutex<()>>>>>,
        scope_locking: bool,
    }

    impl Default for MockPartnerStore {
        fn default() -> Self {
            Self {
                state: Arc::default(),
                scope_locks: Arc::default(),
                scope_locking: true,
            }
        }
    }

    impl MockPartnerStore {
        /// Creates an empty store with scope locking enabled
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes [`PartnerTransaction::lock_scope`] a no-op
        pub fn without_scope_locking(mut self) -> Self {
            self.scope_locking = false;
            self
        }

        /// Registers an active group for a tenant
        pub fn with_group(self, client: ClientId, group: Group) -> Self {
            lock_state(&self.state)
                .groups
                .entry(client)
                .or_default()
                .push((group, true));
            self
        }

        /// Registers a group that exists but is no longer active
        pub fn with_inactive_group(self, client: ClientId, group: Group) -> Self {
            lock_state(&self.state)
                .groups
                .entry(client)
                .or_default()
                .push((group, false));
            self
        }

        /// Seeds a committed partner
        pub fn with_partner(self, record: BusinessPartnerRecord) -> Self {
            lock_state(&self.state).partners.push(StoredPartner {
                record,
                pending_in: None,
            });
            self
        }

        /// Makes the next `count` inserts fail as identifier collisions
        pub fn inject_id_collisions(&self, count: u32) {
            lock_state(&self.state).injected_id_collisions = count;
        }

        /// Makes the next insert fail with a backend error
        pub fn inject_insert_failure(&self, message: impl Into<String>) {
            lock_state(&self.state).injected_insert_failure = Some(message.into());
        }

        /// Makes every `begin` fail as if the database were down
        pub fn set_unavailable(&self, unavailable: bool) {
            lock_state(&self.state).unavailable = unavailable;
        }

        /// Committed partners of a tenant, ordered by identifier
        pub fn committed_partners(&self, client: ClientId) -> Vec<BusinessPartnerRecord> {
            let state = lock_state(&self.state);
            let mut partners: Vec<_> = state
                .partners
                .iter()
                .filter(|p| p.pending_in.is_none() && p.record.client_id == client)
                .map(|p| p.record.clone())
                .collect();
            partners.sort_by_key(|p| p.id);
            partners
        }

        /// Number of committed transactions
        pub fn commit_count(&self) -> u32 {
            lock_state(&self.state).commits
        }

        /// Number of rolled back transactions, explicit or on drop
        pub fn rollback_count(&self) -> u32 {
            lock_state(&self.state).rollbacks
        }

        fn scope_lock(&self, client: ClientId) -> Arc<tokio::sync::Mutex<()>> {
            self.scope_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .entry(client)
                .or_default()
                .clone()
        }
    }

    impl DomainPort for MockPartnerStore {}

    #[async_trait]
    impl HealthCheckable for MockPartnerStore {
        async fn health_check(&self) -> HealthCheckResult {
            let unavailable = lock_state(&self.state).unavailable;
            HealthCheckResult {
                adapter_id: "mock-partner-store".to_string(),
                status: if unavailable {
                    AdapterHealth::Unhealthy
                } else {
                    AdapterHealth::Healthy
                },
                latency_ms: 0,
                message: Some("In-memory partner store".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PartnerStore for MockPartnerStore {
        type Tx = MockTransaction;

        async fn begin(&self) -> Result<MockTransaction, StorageError> {
            let mut state = lock_state(&self.state);
            if state.unavailable {
                return Err(StorageError::Unavailable("mock store is offline".to_string()));
            }
            state.next_tx += 1;
            Ok(MockTransaction {
                id: state.next_tx,
                store: self.clone(),
                scope_guard: None,
                finished: false,
            })
        }

        async fn list_partners(
            &self,
            client: ClientId,
            query: &PartnerQuery,
        ) -> Result<Vec<PartnerSummary>, StorageError> {
            let state = lock_state(&self.state);
            let term = query.normalized_term();
            let group_names: HashMap<_, _> = state
                .groups
                .get(&client)
                .map(|groups| groups.iter().map(|(g, _)| (g.id, g.name.clone())).collect())
                .unwrap_or_default();

            let mut rows: Vec<PartnerSummary> = state
                .partners
                .iter()
                .filter(|p| p.pending_in.is_none())
                .map(|p| &p.record)
                .filter(|r| r.client_id == client && r.flags.is_active)
                .filter(|r| match &term {
                    Some(term) => {
                        r.name.to_uppercase().contains(term.as_str())
                            || r.tax_id.as_str().contains(term.as_str())
                    }
                    None => true,
                })
                .map(|r| PartnerSummary {
                    id: r.id,
                    code: r.code.clone(),
                    name: r.name.clone(),
                    tax_id: r.tax_id.to_string(),
                    group_name: group_names.get(&r.group_id).cloned(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(rows)
        }

        async fn list_active_groups(&self, client: ClientId) -> Result<Vec<Group>, StorageError> {
            let state = lock_state(&self.state);
            let mut groups: Vec<Group> = state
                .groups
                .get(&client)
                .map(|groups| {
                    groups
                        .iter()
                        .filter(|(_, active)| *active)
                        .map(|(g, _)| g.clone())
                        .collect()
                })
                .unwrap_or_default();
            groups.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(groups)
        }
    }

    /// Transaction handle of [`MockPartnerStore`]
    #[derive(Debug)]
    pub struct MockTransaction {
        id: u64,
        store: MockPartnerStore,
        scope_guard: Option<OwnedMutexGuard<()>>,
        finished: bool,
    }

    impl MockTransaction {
        fn finish(&mut self, commit: bool) {
            let mut state = lock_state(&self.store.state);
            if commit {
                for partner in state.partners.iter_mut() {
                    if partner.pending_in == Some(self.id) {
                        partner.pending_in = None;
                    }
                }
                state.commits += 1;
            } else {
                state.discard(self.id);
                state.rollbacks += 1;
            }
            self.finished = true;
            self.scope_guard = None;
        }
    }

    impl Drop for MockTransaction {
        fn drop(&mut self) {
            if !self.finished {
                self.finish(false);
            }
        }
    }

    #[async_trait]
    impl PartnerTransaction for MockTransaction {
        async fn lock_scope(&mut self, client: ClientId) -> Result<(), StorageError> {
            if self.store.scope_locking && self.scope_guard.is_none() {
                let lock = self.store.scope_lock(client);
                self.scope_guard = Some(lock.lock_owned().await);
            }
            Ok(())
        }

        async fn query_max_id(
            &mut self,
            client: ClientId,
            range: IdRange,
        ) -> Result<Option<PartnerId>, StorageError> {
            let max = lock_state(&self.store.state)
                .partners
                .iter()
                .map(|p| &p.record)
                .filter(|r| r.client_id == client && range.contains(r.id))
                .map(|r| r.id)
                .max();
            // Without the scope lock, let a concurrent flow read the same max
            if !self.store.scope_locking {
                tokio::task::yield_now().await;
            }
            Ok(max)
        }

        async fn insert_partner(&mut self, record: &BusinessPartnerRecord) -> Result<(), StorageError> {
            let mut state = lock_state(&self.store.state);

            if state.injected_id_collisions > 0 {
                state.injected_id_collisions -= 1;
                return Err(StorageError::unique(
                    UniqueTarget::Identifier,
                    format!("partner id {} already taken", record.id),
                ));
            }
            if let Some(message) = state.injected_insert_failure.take() {
                return Err(StorageError::backend(message));
            }

            let group_exists = state
                .groups
                .get(&record.client_id)
                .is_some_and(|groups| groups.iter().any(|(g, _)| g.id == record.group_id));
            if !group_exists {
                return Err(StorageError::foreign_key(format!(
                    "group {} does not exist",
                    record.group_id
                )));
            }

            let same_tenant = state
                .partners
                .iter()
                .map(|p| &p.record)
                .filter(|r| r.client_id == record.client_id);
            for existing in same_tenant {
                if existing.id == record.id {
                    return Err(StorageError::unique(
                        UniqueTarget::Identifier,
                        format!("partner id {} already taken", record.id),
                    ));
                }
                if existing.code == record.code {
                    return Err(StorageError::unique(
                        UniqueTarget::Code,
                        format!("partner code {} already taken", record.code),
                    ));
                }
            }

            state.partners.push(StoredPartner {
                record: record.clone(),
                pending_in: Some(self.id),
            });
            Ok(())
        }

        async fn commit(mut self) -> Result<(), StorageError> {
            self.finish(true);
            Ok(())
        }

        async fn rollback(mut self) -> Result<(), StorageError> {
            self.finish(false);
            Ok(())
        }
    }
}
