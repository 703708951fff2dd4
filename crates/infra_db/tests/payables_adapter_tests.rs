//! PostgreSQL adapter tests
//!
//! These run against a disposable PostgreSQL container and are ignored by
//! default. Run with `cargo test -p infra_db -- --ignored`.

use std::sync::Arc;

use core_kernel::{Money, PortError, SettlementId};
use domain_payables::{
    DateRange, EntityPair, LegalEntity, LiabilityChange, PayablesEngine, PayablesReadPort,
    PayablesWritePort, SettlementRequest,
};
use infra_db::PostgresPayablesAdapter;
use sqlx::PgPool;
use test_utils::{db_test, ConfigFixtures, DateFixtures, InvoiceBuilder, PaymentBuilder, ScenarioFixtures, TestVendor};

async fn seeded_adapter(pool: PgPool) -> PostgresPayablesAdapter {
    let adapter = PostgresPayablesAdapter::new(pool);
    let invoice = ScenarioFixtures::shared_invoice();
    adapter
        .insert_vendor(invoice.vendor_id, "Seeded Vendor")
        .await
        .unwrap();
    adapter.insert_invoice(&invoice).await.unwrap();
    adapter
}

fn engine(adapter: &PostgresPayablesAdapter) -> PayablesEngine {
    let adapter = Arc::new(adapter.clone());
    PayablesEngine::new(ConfigFixtures::engine_config(), adapter.clone(), adapter)
}

db_test!(test_fetch_documents_for_unknown_vendor, |pool: PgPool| async move {
    let adapter = PostgresPayablesAdapter::new(pool);
    let result = adapter
        .fetch_vendor_documents(TestVendor::new().id, DateRange::unbounded())
        .await;
    assert!(matches!(result, Err(PortError::NotFound { .. })));
});

db_test!(test_documents_round_trip, |pool: PgPool| async move {
    let adapter = PostgresPayablesAdapter::new(pool);
    let vendor = TestVendor::new();
    adapter.insert_vendor(vendor.id, &vendor.name).await.unwrap();

    let invoice = InvoiceBuilder::new(vendor.id)
        .entity(LegalEntity::B)
        .dated(DateFixtures::jan(3))
        .gross_cents(50_000)
        .build();
    let late = InvoiceBuilder::new(vendor.id)
        .dated(DateFixtures::feb(20))
        .build();
    let payment = PaymentBuilder::for_invoice(&invoice)
        .dated(DateFixtures::jan(15))
        .cents(20_000)
        .build();
    adapter.insert_invoice(&invoice).await.unwrap();
    adapter.insert_invoice(&late).await.unwrap();
    adapter.insert_payment(&payment).await.unwrap();

    let documents = adapter
        .fetch_vendor_documents(vendor.id, DateRange::until(Some(DateFixtures::jan(31))))
        .await
        .unwrap();
    assert_eq!(documents.invoices, vec![invoice.clone()]);
    assert_eq!(documents.payments, vec![payment]);

    let all = adapter.list_vendors().await.unwrap();
    assert_eq!(all, vec![vendor.id]);
    assert_eq!(adapter.fetch_invoice(invoice.id).await.unwrap(), invoice);
});

db_test!(test_sync_persists_liability, |pool: PgPool| async move {
    let adapter = seeded_adapter(pool).await;
    let engine = engine(&adapter);
    let invoice = ScenarioFixtures::shared_invoice();

    let change = engine.sync_invoice_liability(invoice.id).await.unwrap();
    assert!(matches!(change, LiabilityChange::Insert(_)));

    let stored = adapter
        .fetch_liability_for_invoice(invoice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payer, LegalEntity::B);
    assert_eq!(stored.amount, Money::from_minor(3_500_000));

    let again = engine.sync_invoice_liability(invoice.id).await.unwrap();
    assert!(matches!(again, LiabilityChange::Unchanged(_)));
});

db_test!(test_settlement_commits_and_updates_remaining, |pool: PgPool| async move {
    let adapter = seeded_adapter(pool).await;
    let engine = engine(&adapter);
    let invoice = ScenarioFixtures::shared_invoice();
    engine.sync_invoice_liability(invoice.id).await.unwrap();

    let request = SettlementRequest::new(
        EntityPair::paid_by(LegalEntity::B),
        Money::from_minor(2_000_000),
        DateFixtures::settlement_date(),
    )
    .unwrap()
    .with_note("partial");
    let settlement = engine.allocate_settlement(&request).await.unwrap();
    assert_eq!(settlement.imputations.len(), 1);

    let stored = adapter
        .fetch_liability_for_invoice(invoice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.remaining, Money::from_minor(1_500_000));
    assert!(!stored.settled);

    let imputations = adapter
        .repository()
        .imputations_for_settlement(*settlement.id.as_uuid())
        .await
        .unwrap();
    assert_eq!(imputations.len(), 1);
    assert_eq!(imputations[0].0, *stored.id.as_uuid());
});

db_test!(test_stale_commit_is_a_conflict, |pool: PgPool| async move {
    let adapter = seeded_adapter(pool).await;
    let engine = engine(&adapter);
    let invoice = ScenarioFixtures::shared_invoice();
    engine.sync_invoice_liability(invoice.id).await.unwrap();

    let request = SettlementRequest::new(
        EntityPair::paid_by(LegalEntity::B),
        Money::from_minor(1_000_000),
        DateFixtures::settlement_date(),
    )
    .unwrap();
    let mut allocation = engine.preview_settlement(&request).await.unwrap();
    adapter.commit_settlement(&allocation).await.unwrap();

    allocation.settlement.id = SettlementId::new_v7();
    let result = adapter.commit_settlement(&allocation).await;
    assert!(matches!(result, Err(PortError::Conflict { .. })));

    let stored = adapter
        .fetch_liability_for_invoice(invoice.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.remaining, Money::from_minor(2_500_000));
});

db_test!(test_liability_write_against_stale_row_is_a_conflict, |pool: PgPool| async move {
    let adapter = seeded_adapter(pool).await;
    let engine = engine(&adapter);
    let invoice = ScenarioFixtures::shared_invoice();
    engine.sync_invoice_liability(invoice.id).await.unwrap();

    let read = adapter
        .fetch_liability_for_invoice(invoice.id)
        .await
        .unwrap()
        .unwrap();
    let duplicate = adapter.upsert_liability(&read, None).await;
    assert!(matches!(duplicate, Err(PortError::Conflict { .. })));

    let request = SettlementRequest::new(
        EntityPair::paid_by(LegalEntity::B),
        Money::from_minor(1_000_000),
        DateFixtures::settlement_date(),
    )
    .unwrap();
    engine.allocate_settlement(&request).await.unwrap();

    let mut cancelled = read.clone();
    cancelled.cancelled = true;
    let result = adapter.upsert_liability(&cancelled, Some(&read)).await;
    assert!(matches!(result, Err(PortError::Conflict { .. })));

    let stored = adapter
        .fetch_liability_for_invoice(invoice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.cancelled);
    assert_eq!(stored.remaining, Money::from_minor(2_500_000));
});

db_test!(test_health_check_reports_healthy, |pool: PgPool| async move {
    use core_kernel::HealthCheckable;

    let adapter = PostgresPayablesAdapter::new(pool);
    let result = adapter.health_check().await;
    assert!(result.is_available());
    assert_eq!(result.adapter_id, "postgres-payables-adapter");
});
