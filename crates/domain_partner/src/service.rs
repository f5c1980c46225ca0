//! Partner application service
//!
//! [`PartnerService::create`] runs the creation flow:
//!
//! 1. Required fields check
//! 2. Tax identifier classification and checksum
//! 3. Per attempt, in one transaction: tenant lock, identifier allocation,
//!    insert, commit
//! 4. Storage failures remapped to [`CreationError`]
//!
//! The tenant lock keeps concurrent flows from reading the same maximum. The
//! store's unique constraint on `(client, id)` is the backstop: a collision
//! rolls the attempt back and allocation is retried, up to `max_attempts`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use core_kernel::{GroupId, OperationMetadata};

use crate::allocator::{AllocationError, IdRange, SequentialIdAllocator};
use crate::error::CreationError;
use crate::partner::{
    BusinessPartnerDraft, BusinessPartnerRecord, CreatedPartner, Group, PartnerSummary,
    TenantMetadata,
};
use crate::ports::{
    ConstraintKind, PartnerQuery, PartnerStore, PartnerTransaction, StorageError, UniqueTarget,
};
use crate::tax_id::TaxIdentifier;

/// Default number of allocate-and-insert attempts per creation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of a single allocate-and-insert attempt
enum AttemptError {
    /// A fresh transaction may succeed
    Retry(RetryReason),
    /// Terminal for the request
    Fatal(CreationError),
}

enum RetryReason {
    /// Another flow took the identifier or won a serialization race
    Collision(String),
    /// The store was briefly unreachable during allocation
    Transient(String),
}

impl RetryReason {
    fn describe(&self) -> &str {
        match self {
            RetryReason::Collision(reason) | RetryReason::Transient(reason) => reason,
        }
    }
}

/// Failure inside an open transaction, before it is classified
enum StepError {
    Lock(StorageError),
    Allocation(AllocationError),
    Insert(StorageError),
}

/// Business partner service
///
/// The store is injected; the service never owns a connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// let service = PartnerService::new(Arc::new(store), metadata)
///     .with_max_attempts(5);
/// let created = service.create(draft, None).await?;
/// ```
pub struct PartnerService<S: PartnerStore> {
    store: Arc<S>,
    metadata: TenantMetadata,
    allocator: SequentialIdAllocator,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl<S: PartnerStore> Clone for PartnerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            metadata: self.metadata,
            allocator: self.allocator,
            max_attempts: self.max_attempts,
            retry_backoff: self.retry_backoff,
        }
    }
}

impl<S: PartnerStore> PartnerService<S> {
    /// Creates a service writing under `metadata` with the default range
    pub fn new(store: Arc<S>, metadata: TenantMetadata) -> Self {
        Self {
            store,
            metadata,
            allocator: SequentialIdAllocator::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(10),
        }
    }

    pub fn with_id_range(mut self, range: IdRange) -> Self {
        self.allocator = SequentialIdAllocator::new(range);
        self
    }

    /// Sets the attempt budget; zero is treated as one
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Base delay between attempts, multiplied by the attempt number
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metadata(&self) -> &TenantMetadata {
        &self.metadata
    }

    /// Validates a draft and persists it with a freshly allocated identifier
    #[instrument(
        skip(self, draft, op),
        fields(
            code = %draft.code.trim(),
            correlation_id = tracing::field::Empty,
            initiated_by = tracing::field::Empty
        )
    )]
    pub async fn create(
        &self,
        draft: BusinessPartnerDraft,
        op: Option<OperationMetadata>,
    ) -> Result<CreatedPartner, CreationError> {
        if let Some(op) = &op {
            let span = tracing::Span::current();
            if let Some(correlation_id) = op.correlation_id.as_deref() {
                span.record("correlation_id", tracing::field::display(correlation_id));
            }
            if let Some(actor) = op.initiated_by.as_deref() {
                span.record("initiated_by", tracing::field::display(actor));
            }
        }

        let missing = draft.missing_fields();
        let group_id = match draft.group_id {
            Some(group_id) if missing.is_empty() => group_id,
            _ => return Err(CreationError::MissingField { fields: missing }),
        };

        let tax_id = TaxIdentifier::new(&draft.tax_id);
        let validation = tax_id.validate();
        let kind = match validation.outcome() {
            Ok(kind) => kind,
            Err(failure) => {
                return Err(CreationError::InvalidTaxId {
                    attempted: validation.attempted,
                    failure,
                    message: validation.message,
                })
            }
        };

        let mut last_retry = None;
        for attempt in 1..=self.max_attempts {
            match self.attempt(&draft, &tax_id, group_id).await {
                Ok(record) => {
                    info!(
                        partner_id = record.id.value(),
                        client_id = record.client_id.value(),
                        tax_id_kind = %kind,
                        attempt,
                        "Business partner created"
                    );
                    return Ok(CreatedPartner {
                        record,
                        tax_id_kind: kind,
                        tax_id_message: validation.message,
                    });
                }
                Err(AttemptError::Retry(reason)) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = reason.describe(),
                        "Partner creation attempt failed, retrying"
                    );
                    last_retry = Some(reason);
                    if attempt < self.max_attempts && !self.retry_backoff.is_zero() {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
                Err(AttemptError::Fatal(error)) => {
                    warn!(error = %error, "Partner creation rejected");
                    return Err(error);
                }
            }
        }

        match last_retry {
            Some(RetryReason::Transient(reason)) => Err(CreationError::persistence(reason)),
            _ => Err(CreationError::AllocationContention {
                attempts: self.max_attempts,
            }),
        }
    }

    /// Active partners of the service's tenant
    pub async fn list_partners(
        &self,
        query: &PartnerQuery,
    ) -> Result<Vec<PartnerSummary>, StorageError> {
        self.store.list_partners(self.metadata.scope.client, query).await
    }

    /// Active groups of the service's tenant
    pub async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        self.store.list_active_groups(self.metadata.scope.client).await
    }

    async fn attempt(
        &self,
        draft: &BusinessPartnerDraft,
        tax_id: &TaxIdentifier,
        group_id: GroupId,
    ) -> Result<BusinessPartnerRecord, AttemptError> {
        let mut tx = self.store.begin().await.map_err(transient_or_fatal)?;

        match self.allocate_and_insert(&mut tx, draft, tax_id, group_id).await {
            Ok(record) => match tx.commit().await {
                Ok(()) => Ok(record),
                Err(StorageError::Conflict(reason)) => {
                    Err(AttemptError::Retry(RetryReason::Collision(reason)))
                }
                Err(e) => Err(AttemptError::Fatal(CreationError::persistence(e.to_string()))),
            },
            Err(step) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "Rollback after failed attempt did not complete");
                }
                Err(classify(step, draft, group_id))
            }
        }
    }

    async fn allocate_and_insert(
        &self,
        tx: &mut S::Tx,
        draft: &BusinessPartnerDraft,
        tax_id: &TaxIdentifier,
        group_id: GroupId,
    ) -> Result<BusinessPartnerRecord, StepError> {
        let client = self.metadata.scope.client;

        tx.lock_scope(client).await.map_err(StepError::Lock)?;
        let id = self
            .allocator
            .allocate(tx, client)
            .await
            .map_err(StepError::Allocation)?;

        let record = BusinessPartnerRecord::assemble(
            id,
            &draft.code,
            &draft.name,
            tax_id.clone(),
            group_id,
            &self.metadata,
            Utc::now(),
        );
        tx.insert_partner(&record).await.map_err(StepError::Insert)?;

        Ok(record)
    }
}

/// Maps a failed step to retry or a terminal creation error
fn classify(step: StepError, draft: &BusinessPartnerDraft, group_id: GroupId) -> AttemptError {
    match step {
        StepError::Allocation(AllocationError::Exhausted { range }) => {
            AttemptError::Fatal(CreationError::IdRangeExhausted {
                start: range.start(),
                end: range.end(),
            })
        }
        StepError::Lock(e) | StepError::Allocation(AllocationError::Storage(e)) => {
            transient_or_fatal(e)
        }
        StepError::Insert(e) => match e.constraint() {
            Some(ConstraintKind::Unique(UniqueTarget::Identifier)) => {
                AttemptError::Retry(RetryReason::Collision(e.to_string()))
            }
            Some(ConstraintKind::Unique(UniqueTarget::Code)) => {
                AttemptError::Fatal(CreationError::DuplicateCode {
                    code: draft.code.trim().to_string(),
                })
            }
            Some(ConstraintKind::ForeignKey) => {
                AttemptError::Fatal(CreationError::InvalidGroup { group_id })
            }
            None => match e {
                StorageError::Conflict(reason) => {
                    AttemptError::Retry(RetryReason::Collision(reason))
                }
                other => AttemptError::Fatal(CreationError::persistence(other.to_string())),
            },
        },
    }
}

fn transient_or_fatal(error: StorageError) -> AttemptError {
    match error {
        StorageError::Conflict(reason) => AttemptError::Retry(RetryReason::Collision(reason)),
        e if e.is_transient() => AttemptError::Retry(RetryReason::Transient(e.to_string())),
        e => AttemptError::Fatal(CreationError::persistence(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockPartnerStore;
    use crate::tax_id::{TaxIdFailure, TaxIdKind};
    use core_kernel::{ClientId, PartnerId, TenantScope, UserId};

    const CLIENT: ClientId = ClientId::new(11);
    const GROUP: GroupId = GroupId::new(103);

    fn group(id: GroupId, name: &str) -> Group {
        Group {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    fn store() -> MockPartnerStore {
        MockPartnerStore::new().with_group(CLIENT, group(GROUP, "Standard Customers"))
    }

    fn service(store: MockPartnerStore) -> PartnerService<MockPartnerStore> {
        let metadata = TenantMetadata::new(TenantScope::new(CLIENT, 0), UserId::new(100));
        PartnerService::new(Arc::new(store), metadata).with_retry_backoff(Duration::ZERO)
    }

    fn draft(code: &str) -> BusinessPartnerDraft {
        BusinessPartnerDraft::new(code, "Juan Perez", "1710034065", GROUP)
    }

    #[tokio::test]
    async fn test_create_assigns_range_start_and_classifies_tax_id() {
        let service = service(store());

        let created = service.create(draft("CLIE001"), None).await.unwrap();

        assert_eq!(created.record.id, PartnerId::new(1000));
        assert_eq!(created.tax_id_kind, TaxIdKind::Cedula);
        assert_eq!(created.record.client_id, CLIENT);
        assert!(created.record.flags.is_customer);
        assert_eq!(created.record.created_by, UserId::new(100));
        assert_eq!(service.store().committed_partners(CLIENT).len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected_and_rolled_back() {
        let service = service(store());
        service.create(draft("CLIE001"), None).await.unwrap();

        let result = service.create(draft("CLIE001"), None).await;

        assert_eq!(
            result.unwrap_err(),
            CreationError::DuplicateCode { code: "CLIE001".to_string() }
        );
        assert_eq!(service.store().committed_partners(CLIENT).len(), 1);
        assert_eq!(service.store().rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_are_named() {
        let service = service(store());
        let draft = BusinessPartnerDraft {
            code: "CLIE002".to_string(),
            name: " ".to_string(),
            tax_id: "1710034065".to_string(),
            group_id: None,
        };

        let error = service.create(draft, None).await.unwrap_err();

        assert_eq!(error, CreationError::MissingField { fields: vec!["name", "group_id"] });
        assert_eq!(service.store().commit_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_tax_id_never_opens_a_transaction() {
        let service = service(store());
        let mut bad = draft("CLIE003");
        bad.tax_id = "1710034066".to_string();

        let error = service.create(bad, None).await.unwrap_err();

        match error {
            CreationError::InvalidTaxId { attempted, failure, message } => {
                assert_eq!(attempted, Some(TaxIdKind::Cedula));
                assert_eq!(failure, TaxIdFailure::ChecksumMismatch);
                assert!(message.contains("checksum"));
            }
            other => panic!("expected InvalidTaxId, got {:?}", other),
        }
        assert_eq!(service.store().commit_count(), 0);
        assert_eq!(service.store().rollback_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_group_maps_to_invalid_group() {
        let service = service(store());
        let mut unknown = draft("CLIE004");
        unknown.group_id = Some(GroupId::new(999));

        let error = service.create(unknown, None).await.unwrap_err();

        assert_eq!(error, CreationError::InvalidGroup { group_id: GroupId::new(999) });
        assert!(service.store().committed_partners(CLIENT).is_empty());
    }

    #[tokio::test]
    async fn test_identifier_collision_is_retried() {
        let service = service(store());
        service.store().inject_id_collisions(2);

        let created = service.create(draft("CLIE005"), None).await.unwrap();

        assert_eq!(created.record.id, PartnerId::new(1000));
        assert_eq!(service.store().rollback_count(), 2);
        assert_eq!(service.store().commit_count(), 1);
    }

    #[tokio::test]
    async fn test_persistent_collisions_exhaust_attempts() {
        let service = service(store()).with_max_attempts(3);
        service.store().inject_id_collisions(3);

        let error = service.create(draft("CLIE006"), None).await.unwrap_err();

        assert_eq!(error, CreationError::AllocationContention { attempts: 3 });
        assert!(service.store().committed_partners(CLIENT).is_empty());
        assert_eq!(service.store().rollback_count(), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_rolls_back_without_retry() {
        let service = service(store());
        service.store().inject_insert_failure("disk full");

        let error = service.create(draft("CLIE007"), None).await.unwrap_err();

        assert!(matches!(error, CreationError::Persistence(ref msg) if msg.contains("disk full")));
        assert_eq!(service.store().rollback_count(), 1);
        assert!(service.store().committed_partners(CLIENT).is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_reports_persistence_after_retries() {
        let service = service(store());
        service.store().set_unavailable(true);

        let error = service.create(draft("CLIE008"), None).await.unwrap_err();

        assert!(matches!(error, CreationError::Persistence(_)));
        assert!(error.is_retryable());
    }

    fn seeded(client: ClientId, id: i32, code: &str, name: &str) -> BusinessPartnerRecord {
        let metadata = TenantMetadata::new(TenantScope::new(client, 0), UserId::new(100));
        BusinessPartnerRecord::assemble(
            PartnerId::new(id),
            code,
            name,
            TaxIdentifier::new("1710034065001"),
            GROUP,
            &metadata,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_allocation_continues_after_highest_id() {
        let service = service(store().with_partner(seeded(CLIENT, 4999, "OLD", "Existing")));

        let created = service.create(draft("CLIE009"), None).await.unwrap();

        assert_eq!(created.record.id, PartnerId::new(5000));
    }

    #[tokio::test]
    async fn test_full_range_reports_exhaustion() {
        let service = service(store().with_partner(seeded(CLIENT, 5000, "LAST", "Existing")));

        let error = service.create(draft("CLIE010"), None).await.unwrap_err();

        assert_eq!(error, CreationError::IdRangeExhausted { start: 1000, end: 5000 });
        assert_eq!(service.store().committed_partners(CLIENT).len(), 1);
    }

    #[tokio::test]
    async fn test_ids_outside_range_are_ignored() {
        let store = store()
            .with_partner(seeded(CLIENT, 42, "LEGACY", "Legacy"))
            .with_partner(seeded(CLIENT, 900_001, "IMPORT", "Imported"));
        let service = service(store);

        let created = service.create(draft("CLIE011"), None).await.unwrap();

        assert_eq!(created.record.id, PartnerId::new(1000));
    }

    #[tokio::test]
    async fn test_tenants_allocate_independently() {
        let other = ClientId::new(12);
        let service = service(store().with_partner(seeded(other, 1500, "ELSE", "Elsewhere")));

        let created = service.create(draft("CLIE012"), None).await.unwrap();

        assert_eq!(created.record.id, PartnerId::new(1000));
        assert_eq!(service.store().committed_partners(other).len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_operation_metadata_is_recorded_on_create_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = service(store());
        let op = OperationMetadata::with_correlation_id("req-42").initiated_by("http");
        let created = service.create(draft("CLIE013"), Some(op)).await.unwrap();

        assert_eq!(created.record.code, "CLIE013");
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("Business partner created"))
            .unwrap();
        assert!(line.contains("correlation_id=req-42"), "{}", line);
        assert!(line.contains("initiated_by=http"), "{}", line);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creations_get_distinct_consecutive_ids() {
        let service = service(store());

        let handles: Vec<_> = (0..20)
            .map(|n| {
                let service = service.clone();
                tokio::spawn(async move { service.create(draft(&format!("PAR{:03}", n)), None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let ids: Vec<i32> = service
            .store()
            .committed_partners(CLIENT)
            .iter()
            .map(|p| p.id.value())
            .collect();
        assert_eq!(ids, (1000..1020).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unlocked_store_still_yields_unique_ids_through_retry() {
        let service = service(store().without_scope_locking()).with_max_attempts(10);

        let (a, b) = tokio::join!(
            service.create(draft("RACE1"), None),
            service.create(draft("RACE2"), None)
        );

        let mut ids = vec![a.unwrap().record.id.value(), b.unwrap().record.id.value()];
        ids.sort();
        assert_eq!(ids, vec![1000, 1001]);
        assert!(service.store().rollback_count() >= 1);
        assert_eq!(service.store().commit_count(), 2);
    }

    #[tokio::test]
    async fn test_listing_filters_by_name_or_tax_id() {
        let store = store()
            .with_partner(seeded(CLIENT, 1000, "A", "Zoila Andrade"))
            .with_partner(seeded(CLIENT, 1001, "B", "Carlos Perez"));
        let service = service(store);

        let all = service.list_partners(&PartnerQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Carlos Perez", "Zoila Andrade"]);
        assert_eq!(all[0].group_name.as_deref(), Some("Standard Customers"));

        let found = service.list_partners(&PartnerQuery::search("perez")).await.unwrap();
        assert_eq!(found.len(), 1);

        let by_tax_id = service.list_partners(&PartnerQuery::search("171003")).await.unwrap();
        assert_eq!(by_tax_id.len(), 2);
    }

    #[tokio::test]
    async fn test_groups_are_active_only_and_sorted() {
        let store = store()
            .with_group(CLIENT, group(GroupId::new(104), "Importers"))
            .with_inactive_group(CLIENT, group(GroupId::new(105), "Archived"));
        let service = service(store);

        let groups = service.list_groups().await.unwrap();

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Importers", "Standard Customers"]);
    }
}
