//! PostgreSQL store integration tests
//!
//! Run with `cargo test -p infra_db -- --ignored` on a machine with Docker.

use std::sync::Arc;
use std::time::Duration;

use domain_partner::{
    CreationError, IdRange, PartnerQuery, PartnerService, PartnerStore, PartnerTransaction,
    TaxIdKind,
};
use infra_db::PostgresPartnerStore;
use test_utils::{
    assert_contiguous_ids, db_test, GroupFixtures, PartnerDraftBuilder, TenantFixtures,
    TestDatabase,
};

async fn seeded(db: &TestDatabase) {
    db.seed_group(TenantFixtures::CLIENT, &GroupFixtures::standard(), true)
        .await
        .expect("seed standard group");
    db.seed_group(TenantFixtures::CLIENT, &GroupFixtures::archived(), false)
        .await
        .expect("seed archived group");
}

fn service(db: &TestDatabase) -> PartnerService<PostgresPartnerStore> {
    PartnerService::new(
        Arc::new(PostgresPartnerStore::new(db.pool().clone())),
        TenantFixtures::metadata(),
    )
    .with_retry_backoff(Duration::from_millis(1))
}

db_test!(test_create_then_duplicate_code, |db| {
    seeded(&db).await;
    let service = service(&db);

    let created = service
        .create(PartnerDraftBuilder::new().build(), None)
        .await
        .expect("first create");
    assert_eq!(created.record.id.value(), 1000);
    assert_eq!(created.tax_id_kind, TaxIdKind::Cedula);

    let duplicate = service.create(PartnerDraftBuilder::new().build(), None).await;
    assert_eq!(
        duplicate.unwrap_err(),
        CreationError::DuplicateCode { code: "CLIE001".to_string() }
    );
    assert_eq!(db.partner_count(TenantFixtures::CLIENT).await.unwrap(), 1);
});

db_test!(test_unknown_group_is_foreign_key_violation, |db| {
    seeded(&db).await;
    let draft = PartnerDraftBuilder::new()
        .with_group(core_kernel::GroupId::new(9999))
        .build();

    let error = service(&db).create(draft, None).await.unwrap_err();

    assert!(matches!(error, CreationError::InvalidGroup { .. }));
    assert_eq!(db.partner_count(TenantFixtures::CLIENT).await.unwrap(), 0);
});

db_test!(test_concurrent_creates_get_contiguous_ids, |db| {
    seeded(&db).await;
    let service = service(&db);

    let handles: Vec<_> = (0..10)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move {
                let draft = PartnerDraftBuilder::new().with_code(format!("CONC{:03}", n)).build();
                service.create(draft, None).await
            })
        })
        .collect();

    let mut records = Vec::new();
    for handle in handles {
        records.push(handle.await.unwrap().expect("create").record);
    }
    assert_contiguous_ids(&records, 1000);
});

db_test!(test_exhausted_range_leaves_table_unchanged, |db| {
    seeded(&db).await;
    let service = service(&db).with_id_range(IdRange::new(1000, 1001).unwrap());

    for code in ["R1", "R2"] {
        service
            .create(PartnerDraftBuilder::new().with_code(code).build(), None)
            .await
            .expect("within range");
    }
    let error = service
        .create(PartnerDraftBuilder::new().with_code("R3").build(), None)
        .await
        .unwrap_err();

    assert_eq!(error, CreationError::IdRangeExhausted { start: 1000, end: 1001 });
    assert_eq!(db.partner_count(TenantFixtures::CLIENT).await.unwrap(), 2);
});

db_test!(test_dropped_transaction_rolls_back, |db| {
    seeded(&db).await;
    let store = PostgresPartnerStore::new(db.pool().clone());
    let record = test_utils::PartnerRecordBuilder::new(1000).build();

    {
        let mut tx = store.begin().await.unwrap();
        tx.lock_scope(TenantFixtures::CLIENT).await.unwrap();
        tx.insert_partner(&record).await.unwrap();
    }

    assert_eq!(db.partner_count(TenantFixtures::CLIENT).await.unwrap(), 0);
});

db_test!(test_listing_and_groups, |db| {
    seeded(&db).await;
    let service = service(&db);
    for (code, name) in [("B1", "Zoila Andrade"), ("B2", "Carlos Perez")] {
        service
            .create(PartnerDraftBuilder::new().with_code(code).with_name(name).build(), None)
            .await
            .unwrap();
    }

    let all = service.list_partners(&PartnerQuery::default()).await.unwrap();
    assert_eq!(all[0].name, "Carlos Perez");
    assert_eq!(all[0].group_name.as_deref(), Some("Standard Customers"));

    let found = service.list_partners(&PartnerQuery::search("perez")).await.unwrap();
    assert_eq!(found.len(), 1);

    let groups = service.list_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, GroupFixtures::STANDARD);
});
