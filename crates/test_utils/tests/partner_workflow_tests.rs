//! Workflow tests across validation, allocation and creation
//!
//! These run against the in-memory store; the PostgreSQL equivalents live in
//! `infra_db/tests`.

use std::sync::Arc;
use std::time::Duration;

use domain_partner::{CreationError, PartnerService, TaxIdKind};
use proptest::prelude::*;
use test_utils::*;

#[tokio::test]
async fn test_reference_scenario() {
    let service = mock_partner_service();

    let created = service
        .create(PartnerDraftBuilder::new().build(), None)
        .await
        .expect("reference draft is valid");
    assert_eq!(created.tax_id_kind, TaxIdKind::Cedula);
    assert_eq!(created.record.id.value(), 1000);

    let repeated = service.create(PartnerDraftBuilder::new().build(), None).await;
    assert!(matches!(repeated, Err(CreationError::DuplicateCode { .. })));
}

#[tokio::test]
async fn test_inactive_group_still_satisfies_reference() {
    // Groups are checked for existence, not activity
    let service = mock_partner_service();
    let draft = PartnerDraftBuilder::new().with_group(GroupFixtures::ARCHIVED).build();

    assert!(service.create(draft, None).await.is_ok());
}

#[tokio::test]
async fn test_each_tax_id_family_is_accepted() {
    let service = mock_partner_service();
    let cases = [
        (TaxIdFixtures::cedula(), TaxIdKind::Cedula),
        (TaxIdFixtures::natural_ruc(), TaxIdKind::Ruc),
        (TaxIdFixtures::private_entity_ruc(), TaxIdKind::Ruc),
        (TaxIdFixtures::public_entity_ruc(), TaxIdKind::Ruc),
    ];

    for (n, (tax_id, kind)) in cases.into_iter().enumerate() {
        let draft = fake_draft(format!("TAX{:03}", n), tax_id, GroupFixtures::VENDORS);
        let created = service.create(draft, None).await.expect("valid tax id");
        assert_eq!(created.tax_id_kind, kind, "{}", tax_id);
    }
    assert_contiguous_ids(
        &service.store().committed_partners(TenantFixtures::CLIENT),
        1000,
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_tenants_allocate_in_parallel() {
    let store = Arc::new(seeded_mock_store());
    let first = PartnerService::new(Arc::clone(&store), TenantFixtures::metadata())
        .with_retry_backoff(Duration::ZERO);
    let second = PartnerService::new(Arc::clone(&store), TenantFixtures::other_metadata())
        .with_retry_backoff(Duration::ZERO);

    let mut handles = Vec::new();
    for n in 0..8 {
        for service in [first.clone(), second.clone()] {
            handles.push(tokio::spawn(async move {
                let draft = PartnerDraftBuilder::new().with_code(format!("P{:02}", n)).build();
                service.create(draft, None).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().expect("create");
    }

    assert_contiguous_ids(&store.committed_partners(TenantFixtures::CLIENT), 1000);
    assert_contiguous_ids(&store.committed_partners(TenantFixtures::OTHER_CLIENT), 1000);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_valid_tax_id_creates_a_partner(tax_id in valid_tax_id_strategy(), code in partner_code_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let service = mock_partner_service();
        let draft = PartnerDraftBuilder::new().with_code(code).with_tax_id(tax_id).build();

        let created = runtime.block_on(service.create(draft, None));
        prop_assert!(created.is_ok(), "{:?}", created);
    }

    #[test]
    fn invalid_lengths_never_reach_storage(tax_id in wrong_length_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let service = mock_partner_service();
        let draft = PartnerDraftBuilder::new().with_tax_id(tax_id).build();

        let result = runtime.block_on(service.create(draft, None));
        let is_invalid_tax_id = matches!(result, Err(CreationError::InvalidTaxId { .. }));
        prop_assert!(is_invalid_tax_id);
        prop_assert_eq!(service.store().commit_count(), 0);
    }
}
