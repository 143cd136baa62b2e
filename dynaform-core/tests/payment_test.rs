mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::*;
use dynaform::database::entities::{form_values, payments};
use dynaform::errors::{DomainError, PaymentError, SubmissionError};
use dynaform::form_types::{RawSubmission, RawValue};
use dynaform::services::signature;
use dynaform::services::{
    InMemoryOtpStore, PaidSubmission, PaymentCoordinator, PaymentSettings, SubmissionWriter,
    SubmitterService,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

const ALICE: &str = "alice@example.com";

fn settings() -> PaymentSettings {
    PaymentSettings {
        key_secret: SECRET.to_string(),
        currency: "INR".to_string(),
    }
}

fn coordinator(db: &DatabaseConnection) -> PaymentCoordinator {
    PaymentCoordinator::new(
        db.clone(),
        memory_assets(),
        Some(Arc::new(StubGateway)),
        settings(),
    )
}

async fn register(db: &DatabaseConnection, identifier: &str) {
    SubmitterService::new(db.clone(), Arc::new(InMemoryOtpStore::new()), None)
        .register(identifier)
        .await
        .unwrap();
}

fn paid(form_id: i32, raw: RawSubmission, signature: String) -> PaidSubmission {
    PaidSubmission {
        form_id,
        identifier: ALICE.to_string(),
        order_id: "order_1".to_string(),
        payment_id: "pay_1".to_string(),
        signature,
        raw,
    }
}

async fn row_counts(db: &DatabaseConnection) -> (u64, u64) {
    (
        form_values::Entity::find().count(db).await.unwrap(),
        payments::Entity::find().count(db).await.unwrap(),
    )
}

#[tokio::test]
async fn test_paid_submission_stores_values_and_payment() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    register(&db, ALICE).await;

    let raw = BTreeMap::from([(c1, RawValue::from("Alice"))]);
    let receipt = coordinator(&db)
        .submit_paid(paid(f2.id, raw, signature::sign(SECRET, "order_1", "pay_1")))
        .await
        .unwrap();

    assert_eq!(receipt.amount, Decimal::from(500));
    assert_eq!(receipt.currency, "INR");
    assert_eq!(receipt.value_count, 1);

    let values = form_values::Entity::find().all(&db).await.unwrap();
    let records = payments::Entity::find().all(&db).await.unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(records.len(), 1);
    assert_eq!(values[0].submission_id, receipt.submission_id);
    assert_eq!(records[0].submission_id, receipt.submission_id);
    assert_eq!(records[0].amount_minor, 50000);
    assert_eq!(records[0].status, payments::STATUS_CAPTURED);
    assert_eq!(records[0].gateway_order_id, "order_1");
    assert_eq!(records[0].gateway_payment_id, "pay_1");
}

#[tokio::test]
async fn test_bad_signature_writes_nothing() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    register(&db, ALICE).await;

    let raw = BTreeMap::from([(c1, RawValue::from("Alice"))]);
    let forged = signature::sign("wrong_secret", "order_1", "pay_1");
    let err = coordinator(&db)
        .submit_paid(paid(f2.id, raw, forged))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::InvalidSignature));
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(err.public_message(), "Payment could not be verified");
    assert_eq!(row_counts(&db).await, (0, 0));
}

#[tokio::test]
async fn test_unknown_submitter_is_rejected() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;

    let raw = BTreeMap::from([(c1, RawValue::from("Alice"))]);
    let err = coordinator(&db)
        .submit_paid(paid(f2.id, raw, signature::sign(SECRET, "order_1", "pay_1")))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::SubmitterNotFound(_)));
    assert_eq!(err.http_status_code(), 404);
    assert_eq!(row_counts(&db).await, (0, 0));
}

#[tokio::test]
async fn test_invalid_values_roll_back_the_payment() {
    let db = setup_db().await;
    let (f2, _) = paid_form(&db).await;
    register(&db, ALICE).await;

    let err = coordinator(&db)
        .submit_paid(paid(
            f2.id,
            RawSubmission::new(),
            signature::sign(SECRET, "order_1", "pay_1"),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PaymentError::Submission(SubmissionError::MissingRequiredField(_))
    ));
    assert_eq!(err.error_code(), "MISSING_REQUIRED_FIELD");
    assert_eq!(row_counts(&db).await, (0, 0));
}

#[tokio::test]
async fn test_one_page_pdf_rolls_back_the_payment() {
    let db = setup_db().await;
    let form = create_form(&db, "Paid upload", Some(100)).await;
    let resume = add_column(&db, form.id, "Resume", "file", 1, None).await.column.id;
    register(&db, ALICE).await;

    let raw = BTreeMap::from([(resume, pdf_value(1))]);
    let err = coordinator(&db)
        .submit_paid(paid(form.id, raw, signature::sign(SECRET, "order_1", "pay_1")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::Submission(SubmissionError::FilePageCountInvalid { pages: 1, .. })
    ));
    assert_eq!(row_counts(&db).await, (0, 0));
}

#[tokio::test]
async fn test_paid_submission_shows_in_ledger() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    register(&db, ALICE).await;

    let raw = BTreeMap::from([(c1, RawValue::from("Alice"))]);
    let receipt = coordinator(&db)
        .submit_paid(paid(f2.id, raw, signature::sign(SECRET, "order_1", "pay_1")))
        .await
        .unwrap();

    let ledger = SubmissionWriter::new(db.clone(), memory_assets())
        .ledger(OWNER)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].submission_id, receipt.submission_id);
    let payment = ledger[0].payment.as_ref().unwrap();
    assert_eq!(payment.amount, Decimal::from(500));
    assert_eq!(payment.payment_id, "pay_1");
}

#[tokio::test]
async fn test_create_order_for_fee_form() {
    let db = setup_db().await;
    let (f2, _) = paid_form(&db).await;

    let order = coordinator(&db).create_order(f2.id).await.unwrap();
    assert_eq!(order.amount_minor, 50000);
    assert_eq!(order.currency, "INR");
    assert!(order.receipt.starts_with("receipt_"));
}

#[tokio::test]
async fn test_create_order_rejects_free_and_unknown_forms() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let coordinator = coordinator(&db);

    assert!(matches!(
        coordinator.create_order(f1.form.id).await.unwrap_err(),
        PaymentError::NoFeeConfigured(_)
    ));
    assert!(matches!(
        coordinator.create_order(999).await.unwrap_err(),
        PaymentError::FormNotFound(999)
    ));
}

#[tokio::test]
async fn test_create_order_without_gateway() {
    let db = setup_db().await;
    let (f2, _) = paid_form(&db).await;
    let coordinator = PaymentCoordinator::new(db.clone(), memory_assets(), None, settings());

    let err = coordinator.create_order(f2.id).await.unwrap_err();
    assert!(matches!(err, PaymentError::Gateway(_)));
    assert_eq!(err.http_status_code(), 502);
}

#[tokio::test]
async fn test_missing_secret_refuses_every_paid_submission() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    register(&db, ALICE).await;
    let coordinator = PaymentCoordinator::new(
        db.clone(),
        memory_assets(),
        Some(Arc::new(StubGateway)),
        PaymentSettings::default(),
    );

    // a signature made with the empty key must not pass either
    let raw = BTreeMap::from([(c1, RawValue::from("Alice"))]);
    let err = coordinator
        .submit_paid(paid(f2.id, raw, signature::sign("", "order_1", "pay_1")))
        .await
        .unwrap_err();

    assert!(matches!(&err, PaymentError::Gateway(msg) if msg == "payment secret not configured"));
    assert_eq!(row_counts(&db).await, (0, 0));
}

#[tokio::test]
async fn test_payment_cannot_be_replayed() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    register(&db, ALICE).await;
    let coordinator = coordinator(&db);
    let sig = signature::sign(SECRET, "order_1", "pay_1");

    let first = coordinator
        .submit_paid(paid(f2.id, BTreeMap::from([(c1, RawValue::from("Alice"))]), sig.clone()))
        .await
        .unwrap();
    let err = coordinator
        .submit_paid(paid(f2.id, BTreeMap::from([(c1, RawValue::from("Mallory"))]), sig))
        .await
        .unwrap_err();

    assert!(matches!(&err, PaymentError::AlreadyUsed(id) if id == "pay_1"));
    assert_eq!(err.http_status_code(), 409);
    assert_eq!(err.error_code(), "PAYMENT_ALREADY_USED");

    let values = form_values::Entity::find().all(&db).await.unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value, "Alice");
    assert_eq!(values[0].submission_id, first.submission_id);
    assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_paid_upload_stores_file_reference() {
    let db = setup_db().await;
    let form = create_form(&db, "Paid upload", Some(100)).await;
    let resume = add_column(&db, form.id, "Resume", "file", 1, None).await.column.id;
    register(&db, ALICE).await;
    let assets = memory_assets();
    let coordinator = PaymentCoordinator::new(
        db.clone(),
        assets.clone(),
        Some(Arc::new(StubGateway)),
        settings(),
    );

    let raw = BTreeMap::from([(resume, pdf_value(3))]);
    coordinator
        .submit_paid(paid(form.id, raw, signature::sign(SECRET, "order_1", "pay_1")))
        .await
        .unwrap();

    let stored = assets.stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    let values = form_values::Entity::find().all(&db).await.unwrap();
    assert_eq!(values[0].value, stored[0]);
}
