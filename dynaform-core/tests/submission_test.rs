mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::*;
use dynaform::database::entities::{form_values, forms};
use dynaform::errors::{DomainError, SubmissionError};
use dynaform::form_types::{RawSubmission, RawValue};
use dynaform::services::form_service::FormDraft;
use dynaform::services::{FormService, SubmissionWriter};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

const ALICE: &str = "alice@example.com";

fn raw(pairs: &[(i32, &str)]) -> RawSubmission {
    pairs
        .iter()
        .map(|(col, value)| (*col, RawValue::from(*value)))
        .collect()
}

async fn value_rows(db: &sea_orm::DatabaseConnection) -> Vec<form_values::Model> {
    form_values::Entity::find().all(db).await.unwrap()
}

#[tokio::test]
async fn test_free_form_accepts_required_value_only() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello")]))
        .await
        .unwrap();

    assert_eq!(receipt.value_count, 1);
    let rows = value_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].column_id, f1.c1);
    assert_eq!(rows[0].value, "hello");
    assert_eq!(rows[0].submission_id, receipt.submission_id);
}

#[tokio::test]
async fn test_missing_required_field_writes_nothing() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let err = writer
        .create(f1.form.id, ALICE, RawSubmission::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::MissingRequiredField(col) if col == f1.c1));
    assert_eq!(err.http_status_code(), 400);
    assert!(value_rows(&db).await.is_empty());
}

#[tokio::test]
async fn test_dropdown_value_must_be_an_option() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let err = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello"), (f1.c2, "C")]))
        .await
        .unwrap_err();
    assert_eq!(err.column_id(), Some(f1.c2));

    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello"), (f1.c2, "B")]))
        .await
        .unwrap();
    assert_eq!(receipt.value_count, 2);
}

#[tokio::test]
async fn test_fee_form_requires_payment() {
    let db = setup_db().await;
    let (f2, c1) = paid_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let err = writer
        .create(f2.id, ALICE, raw(&[(c1, "Alice")]))
        .await
        .unwrap_err();

    match &err {
        SubmissionError::PaymentRequired { form_id, fee } => {
            assert_eq!(*form_id, f2.id);
            assert_eq!(*fee, Decimal::from(500));
        }
        other => panic!("expected PaymentRequired, got {:?}", other),
    }
    assert_eq!(err.http_status_code(), 402);
    assert!(value_rows(&db).await.is_empty());
}

#[tokio::test]
async fn test_unknown_form_is_not_found() {
    let db = setup_db().await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let err = writer
        .create(42, ALICE, raw(&[(1, "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::FormNotFound(42)));
}

#[tokio::test]
async fn test_values_for_unknown_columns_only_is_empty() {
    let db = setup_db().await;
    let form = create_form(&db, "Optional", None).await;
    let col = add_column(&db, form.id, "Notes", "text", 1, None).await.column.id;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let err = writer
        .create(form.id, ALICE, raw(&[(col + 100, "ignored")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::EmptySubmission));
}

#[tokio::test]
async fn test_check_existing_before_and_after_create() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let before = writer.check_existing(f1.form.id, ALICE).await.unwrap();
    assert!(!before.has_submission);
    assert_eq!(before.submission_id, None);

    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello")]))
        .await
        .unwrap();

    let after = writer.check_existing(f1.form.id, ALICE).await.unwrap();
    assert!(after.has_submission);
    assert_eq!(after.submission_id, Some(receipt.submission_id));

    let stranger = writer
        .check_existing(f1.form.id, "bob@example.com")
        .await
        .unwrap();
    assert!(!stranger.has_submission);
}

#[tokio::test]
async fn test_single_submission_forms_reject_a_second_create() {
    let db = setup_db().await;
    let form = FormService::new(db.clone())
        .create_form(
            OWNER,
            FormDraft {
                name: "Once".to_string(),
                single_submission: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let col = add_column(&db, form.id, "Answer", "text", 1, None).await.column.id;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let first = writer.create(form.id, ALICE, raw(&[(col, "yes")])).await.unwrap();
    let err = writer
        .create(form.id, ALICE, raw(&[(col, "again")]))
        .await
        .unwrap_err();
    match err {
        SubmissionError::DuplicateSubmission { submission_id, .. } => {
            assert_eq!(submission_id, first.submission_id)
        }
        other => panic!("expected DuplicateSubmission, got {:?}", other),
    }

    // other submitters are unaffected
    writer
        .create(form.id, "bob@example.com", raw(&[(col, "yes")]))
        .await
        .unwrap();
    assert_eq!(value_rows(&db).await.len(), 2);
}

#[tokio::test]
async fn test_update_overwrites_but_never_adds_rows() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello")]))
        .await
        .unwrap();

    let update = writer
        .update(
            &receipt.submission_id,
            f1.form.id,
            ALICE,
            raw(&[(f1.c1, "changed"), (f1.c2, "A")]),
        )
        .await
        .unwrap();

    assert_eq!(update.updated, 1);
    assert_eq!(update.skipped, 1);
    let rows = value_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, "changed");
}

#[tokio::test]
async fn test_update_rejects_invalid_values_and_unknown_submissions() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello")]))
        .await
        .unwrap();

    let err = writer
        .update(&receipt.submission_id, f1.form.id, ALICE, raw(&[(f1.c1, "  ")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::MissingRequiredField(_)));

    let err = writer
        .update("no-such-submission", f1.form.id, ALICE, raw(&[(f1.c1, "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::SubmissionNotFound(_)));

    let err = writer
        .update(&receipt.submission_id, f1.form.id, "nobody@example.com", raw(&[(f1.c1, "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::SubmitterNotFound(_)));
}

#[tokio::test]
async fn test_read_only_columns_are_not_updated() {
    let db = setup_db().await;
    let form = create_form(&db, "Locked", None).await;
    let name = add_column(&db, form.id, "Name", "text", 1, Some(1)).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let receipt = writer
        .create(form.id, ALICE, raw(&[(name.column.id, "Alice")]))
        .await
        .unwrap();

    dynaform::services::FormDetailService::new(db.clone())
        .set_read_only(OWNER, name.binding.id, true)
        .await
        .unwrap();

    let update = writer
        .update(&receipt.submission_id, form.id, ALICE, raw(&[(name.column.id, "Mallory")]))
        .await
        .unwrap();
    assert_eq!(update.updated, 0);
    assert_eq!(value_rows(&db).await[0].value, "Alice");
}

#[tokio::test]
async fn test_bad_read_only_value_does_not_block_the_rest_of_an_update() {
    let db = setup_db().await;
    let form = create_form(&db, "Locked", None).await;
    let name = add_column(&db, form.id, "Name", "text", 1, Some(1)).await;
    let city = add_column(&db, form.id, "City", "text", 1, Some(2)).await.column.id;
    add_rule(&db, form.id, name.column.id, "required").await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let receipt = writer
        .create(form.id, ALICE, raw(&[(name.column.id, "Alice"), (city, "Pune")]))
        .await
        .unwrap();

    dynaform::services::FormDetailService::new(db.clone())
        .set_read_only(OWNER, name.binding.id, true)
        .await
        .unwrap();

    let update = writer
        .update(
            &receipt.submission_id,
            form.id,
            ALICE,
            raw(&[(name.column.id, "  "), (city, "Mumbai")]),
        )
        .await
        .unwrap();
    assert_eq!(update.updated, 1);

    let rows = value_rows(&db).await;
    let value_of = |col: i32| rows.iter().find(|r| r.column_id == col).unwrap().value.clone();
    assert_eq!(value_of(name.column.id), "Alice");
    assert_eq!(value_of(city), "Mumbai");
}

#[tokio::test]
async fn test_create_rejects_an_unusable_identifier() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());

    let err = writer
        .create(f1.form.id, "not a person", raw(&[(f1.c1, "hello")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::InvalidSubmitter(_)));
    assert_eq!(err.http_status_code(), 400);
    assert!(value_rows(&db).await.is_empty());
    assert_eq!(
        dynaform::database::entities::submitters::Entity::find()
            .count(&db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_deactivated_submitter_cannot_create() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "first")]))
        .await
        .unwrap();

    let submitter = dynaform::database::entities::submitters::Entity::find()
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut active: dynaform::database::entities::submitters::ActiveModel = submitter.into();
    active.is_active = Set(false);
    active.update(&db).await.unwrap();

    let err = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "second")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::SubmitterNotFound(_)));
    assert_eq!(value_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn test_pdf_page_count_gate() {
    let db = setup_db().await;
    let form = create_form(&db, "Uploads", None).await;
    let resume = add_column(&db, form.id, "Resume", "file", 1, None).await.column.id;
    let assets = memory_assets();
    let writer = SubmissionWriter::new(db.clone(), assets.clone());

    let one_page: RawSubmission = BTreeMap::from([(resume, pdf_value(1))]);
    let err = writer.create(form.id, ALICE, one_page).await.unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::FilePageCountInvalid { col_id, pages: 1 } if col_id == resume
    ));
    assert!(assets.stored.lock().unwrap().is_empty());

    let two_pages: RawSubmission = BTreeMap::from([(resume, pdf_value(2))]);
    writer.create(form.id, ALICE, two_pages).await.unwrap();

    let rows = value_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].value.starts_with("mem://"));
    assert!(rows[0].value.ends_with("resume-2p.pdf"));
}

#[tokio::test]
async fn test_read_views_group_by_submission() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let first = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "one"), (f1.c2, "A")]))
        .await
        .unwrap();
    writer
        .create(f1.form.id, "bob@example.com", raw(&[(f1.c1, "two")]))
        .await
        .unwrap();

    let mine = writer.submitter_values(f1.form.id, ALICE).await.unwrap();
    assert_eq!(mine.form_name, "Free Form");
    assert_eq!(mine.columns.len(), 2);
    assert_eq!(mine.submissions.len(), 1);
    assert_eq!(mine.submissions[0].submission_id, first.submission_id);
    assert_eq!(mine.submissions[0].values.get(&f1.c2).map(String::as_str), Some("A"));

    let everyone = writer.all_values(f1.form.id).await.unwrap();
    assert_eq!(everyone.submissions.len(), 2);
    assert_eq!(everyone.submissions[1].submitter.as_deref(), Some("bob@example.com"));

    let across = writer.values_by_submitter(ALICE).await.unwrap();
    assert_eq!(across.len(), 1);
    assert_eq!(across[0].form_id, f1.form.id);
}

#[tokio::test]
async fn test_soft_delete_hides_a_submission() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let receipt = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "hello")]))
        .await
        .unwrap();

    assert_eq!(
        writer
            .soft_delete(&receipt.submission_id, f1.form.id, ALICE)
            .await
            .unwrap(),
        1
    );
    assert!(!writer.check_existing(f1.form.id, ALICE).await.unwrap().has_submission);

    let active = form_values::Entity::find()
        .filter(form_values::Column::IsActive.eq(true))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(active, 0);

    let err = writer
        .soft_delete(&receipt.submission_id, f1.form.id, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::SubmissionNotFound(_)));
}

#[tokio::test]
async fn test_ledger_lists_owner_submissions_newest_first() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let writer = SubmissionWriter::new(db.clone(), Arc::new(MemoryAssetStore::default()));
    writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "first")]))
        .await
        .unwrap();
    let second = writer
        .create(f1.form.id, "bob@example.com", raw(&[(f1.c1, "second")]))
        .await
        .unwrap();

    let ledger = writer.ledger(OWNER).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].submission_id, second.submission_id);
    assert!(ledger.iter().all(|entry| entry.payment.is_none()));

    assert!(writer.ledger(OWNER + 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_form_rejects_submissions() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let mut active: forms::ActiveModel = f1.form.clone().into();
    active.end_date = Set(Some(chrono::Utc::now() - chrono::Duration::minutes(5)));
    active.update(&db).await.unwrap();

    let writer = SubmissionWriter::new(db.clone(), memory_assets());
    let err = writer
        .create(f1.form.id, ALICE, raw(&[(f1.c1, "late")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::FormNotFound(_)));
}
