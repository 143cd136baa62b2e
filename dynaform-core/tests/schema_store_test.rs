mod common;

use chrono::{Duration, Utc};
use common::*;
use dynaform::database::entities::forms;
use dynaform::errors::{DomainError, ErrorKind, SchemaError};
use dynaform::form_types::{DataType, OptionKind, RuleKind};
use dynaform::services::column_service::ColumnDraft;
use dynaform::services::form_detail_service::{BindingDraft, Placement};
use dynaform::services::form_service::FormDraft;
use dynaform::services::validation_rule_service::RuleDraft;
use dynaform::services::{
    ColumnService, FormDetailService, FormService, OptionService, SchemaAssembler,
    ValidationRuleService,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
async fn test_assembled_columns_ordered_by_section_then_sequence() {
    let db = setup_db().await;
    let form = create_form(&db, "Ordering", None).await;
    let late = add_column(&db, form.id, "Late", "text", 2, Some(1)).await;
    let second = add_column(&db, form.id, "Second", "number", 1, Some(2)).await;
    let first = add_column(&db, form.id, "First", "email", 1, Some(1)).await;

    let columns = SchemaAssembler::new(db.clone())
        .assemble(form.id, None)
        .await
        .unwrap();

    let ids: Vec<i32> = columns.iter().map(|c| c.col_id).collect();
    assert_eq!(ids, vec![first.column.id, second.column.id, late.column.id]);
    assert_eq!(columns[0].data_type, DataType::Email);

    let section_two = SchemaAssembler::new(db.clone())
        .assemble(form.id, Some(2))
        .await
        .unwrap();
    assert_eq!(section_two.len(), 1);
    assert_eq!(section_two[0].column_name, "Late");
}

#[tokio::test]
async fn test_assembly_carries_options_and_rules() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;

    let schema = SchemaAssembler::new(db.clone())
        .schema(f1.form.id, None)
        .await
        .unwrap();

    let c1 = schema.column(f1.c1).unwrap();
    assert!(c1.required);
    assert_eq!(c1.validations, vec![RuleKind::Required]);
    let c2 = schema.column(f1.c2).unwrap();
    assert!(!c2.required);
    assert_eq!(c2.option_values, vec!["A".to_string(), "B".to_string()]);
}

#[tokio::test]
async fn test_options_are_scoped_to_their_form() {
    let db = setup_db().await;
    let f1 = free_form(&db).await;
    let other = create_form(&db, "Other", None).await;
    FormDetailService::new(db.clone())
        .bind_column(
            OWNER,
            BindingDraft {
                form_id: other.id,
                column_id: f1.c2,
                placement: Placement {
                    form_no: Some(1),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
    add_options(&db, other.id, f1.c2, OptionKind::Dropdown, &["X"]).await;

    let schema = SchemaAssembler::new(db.clone())
        .schema(other.id, None)
        .await
        .unwrap();
    assert_eq!(schema.column(f1.c2).unwrap().option_values, vec!["X".to_string()]);

    let listed = OptionService::new(db.clone())
        .list_options(f1.c2, f1.form.id, OptionKind::Dropdown)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_inactive_bindings_and_columns_are_left_out() {
    let db = setup_db().await;
    let form = create_form(&db, "Pruned", None).await;
    let kept = add_column(&db, form.id, "Kept", "text", 1, Some(1)).await;
    let unbound = add_column(&db, form.id, "Unbound", "text", 1, Some(2)).await;
    let retired = add_column(&db, form.id, "Retired", "text", 1, Some(3)).await;

    FormDetailService::new(db.clone())
        .soft_delete_binding(OWNER, unbound.binding.id)
        .await
        .unwrap();
    ColumnService::new(db.clone())
        .soft_delete_column(OWNER, retired.column.id)
        .await
        .unwrap();

    let columns = SchemaAssembler::new(db.clone())
        .assemble(form.id, None)
        .await
        .unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].col_id, kept.column.id);
}

#[tokio::test]
async fn test_missing_or_inactive_form_assembles_empty() {
    let db = setup_db().await;
    let assembler = SchemaAssembler::new(db.clone());
    assert!(assembler.assemble(999, None).await.unwrap().is_empty());

    let form = create_form(&db, "Closed", None).await;
    add_column(&db, form.id, "Name", "text", 1, None).await;
    FormService::new(db.clone())
        .soft_delete_form(OWNER, form.id)
        .await
        .unwrap();

    assert!(assembler.assemble(form.id, None).await.unwrap().is_empty());
    let err = assembler.schema(form.id, None).await.unwrap_err();
    assert!(matches!(err, SchemaError::FormNotFound(id) if id == form.id));
}

#[tokio::test]
async fn test_duplicate_column_name_in_section_conflicts() {
    let db = setup_db().await;
    let form = create_form(&db, "Dupes", None).await;
    add_column(&db, form.id, "Email", "email", 1, None).await;

    let err = ColumnService::new(db.clone())
        .create_bound_column(
            OWNER,
            form.id,
            ColumnDraft {
                name: "  email ".to_string(),
                data_type: "TEXT".to_string(),
            },
            Placement {
                form_no: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaError::DuplicateColumn { form_no: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // the failed create left no orphan column behind
    let columns = ColumnService::new(db.clone()).list_columns(OWNER).await.unwrap();
    assert_eq!(columns.len(), 1);

    // another section may reuse the name
    add_column(&db, form.id, "Email", "email", 2, None).await;
}

#[tokio::test]
async fn test_binding_same_column_twice_conflicts() {
    let db = setup_db().await;
    let form = create_form(&db, "Twice", None).await;
    let record = add_column(&db, form.id, "Phone", "phone", 1, None).await;

    let err = FormDetailService::new(db.clone())
        .bind_column(
            OWNER,
            BindingDraft {
                form_id: form.id,
                column_id: record.column.id,
                placement: Placement {
                    form_no: Some(1),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::AlreadyBound { .. }));
}

#[tokio::test]
async fn test_rename_rejects_existing_name() {
    let db = setup_db().await;
    let form = create_form(&db, "Renames", None).await;
    add_column(&db, form.id, "First name", "text", 1, None).await;
    let last = add_column(&db, form.id, "Last name", "text", 1, None).await;

    let service = ColumnService::new(db.clone());
    let err = service
        .rename_bound_column(
            OWNER,
            last.column.id,
            form.id,
            ColumnDraft {
                name: "FIRST NAME".to_string(),
                data_type: "text".to_string(),
            },
            Placement::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateColumn { .. }));

    let renamed = service
        .rename_bound_column(
            OWNER,
            last.column.id,
            form.id,
            ColumnDraft {
                name: "Surname".to_string(),
                data_type: "text".to_string(),
            },
            Placement {
                sequence_no: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.column.name, "Surname");
    assert_eq!(renamed.binding.sequence_no, 5);
    assert_eq!(renamed.binding.form_no, 1);
}

#[tokio::test]
async fn test_section_numbers_are_allocated() {
    let db = setup_db().await;
    let form = create_form(&db, "Sections", None).await;
    let details = FormDetailService::new(db.clone());
    assert_eq!(details.next_form_no(OWNER, form.id).await.unwrap(), 1);

    add_column(&db, form.id, "A", "text", 3, None).await;
    assert_eq!(details.next_form_no(OWNER, form.id).await.unwrap(), 4);
}

#[tokio::test]
async fn test_create_columns_is_all_or_nothing() {
    let db = setup_db().await;
    let service = ColumnService::new(db.clone());

    let err = service
        .create_columns(
            OWNER,
            vec![
                ColumnDraft {
                    name: "Good".to_string(),
                    data_type: "text".to_string(),
                },
                ColumnDraft {
                    name: "<script>".to_string(),
                    data_type: "text".to_string(),
                },
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidInput(_)));
    assert!(service.list_columns(OWNER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_forms_deactivated_on_listing() {
    let db = setup_db().await;
    let service = FormService::new(db.clone());
    let open = service
        .create_form(
            OWNER,
            FormDraft {
                name: "Open".to_string(),
                end_date: Some(Utc::now() + Duration::days(7)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let expired = create_form(&db, "Expired", None).await;

    let mut active: forms::ActiveModel = expired.clone().into();
    active.end_date = Set(Some(Utc::now() - Duration::days(1)));
    active.update(&db).await.unwrap();

    let listed = service.list_forms_for_owner(OWNER).await.unwrap();
    let flags: Vec<(i32, bool)> = listed.iter().map(|f| (f.id, f.is_active)).collect();
    assert_eq!(flags, vec![(open.id, true), (expired.id, false)]);

    let stored = forms::Entity::find_by_id(expired.id).one(&db).await.unwrap().unwrap();
    assert!(!stored.is_active);
}

#[tokio::test]
async fn test_expired_form_is_not_assembled() {
    let db = setup_db().await;
    let form = create_form(&db, "Lapsed", None).await;
    add_column(&db, form.id, "Name", "text", 1, None).await;
    let mut active: forms::ActiveModel = form.clone().into();
    active.end_date = Set(Some(Utc::now() - Duration::hours(1)));
    active.update(&db).await.unwrap();

    let assembler = SchemaAssembler::new(db.clone());
    assert!(!assembler.form_exists(form.id).await.unwrap());
    assert!(assembler.assemble(form.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_forms_are_owner_scoped() {
    let db = setup_db().await;
    let form = create_form(&db, "Mine", Some(250)).await;
    let service = FormService::new(db.clone());

    let err = service.get_form(OWNER + 1, form.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.http_status_code(), 404);

    assert_eq!(service.form_name(form.id).await.unwrap(), "Mine");
    assert_eq!(form.fee_minor, Some(25000));
    assert!(form.requires_payment());
}

fn text_column(name: &str) -> ColumnDraft {
    ColumnDraft {
        name: name.to_string(),
        data_type: "text".to_string(),
    }
}

#[tokio::test]
async fn test_update_column_rejects_name_taken_in_its_section() {
    let db = setup_db().await;
    let form = create_form(&db, "Contacts", None).await;
    add_column(&db, form.id, "Email", "email", 1, None).await;
    let phone = add_column(&db, form.id, "Phone", "phone", 1, None).await;

    let service = ColumnService::new(db.clone());
    let err = service
        .update_column(OWNER, phone.column.id, text_column("email"))
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateColumn { form_no: 1, .. }));

    let names: Vec<String> = service
        .list_columns(OWNER)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Email", "Phone"]);

    // renaming to its own name in another case is fine
    let renamed = service
        .update_column(OWNER, phone.column.id, text_column("PHONE"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "PHONE");
}

#[tokio::test]
async fn test_rename_checks_every_form_the_column_is_bound_to() {
    let db = setup_db().await;
    let first = create_form(&db, "First", None).await;
    let second = create_form(&db, "Second", None).await;
    let shared = add_column(&db, first.id, "Phone", "phone", 1, None).await;
    add_column(&db, second.id, "Email", "email", 1, None).await;

    FormDetailService::new(db.clone())
        .bind_column(
            OWNER,
            BindingDraft {
                form_id: second.id,
                column_id: shared.column.id,
                placement: Placement {
                    form_no: Some(1),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

    let service = ColumnService::new(db.clone());
    let err = service
        .rename_bound_column(
            OWNER,
            shared.column.id,
            first.id,
            text_column("Email"),
            Placement::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::DuplicateColumn { form_id, .. } if form_id == second.id
    ));

    let err = service
        .update_column(OWNER, shared.column.id, text_column("Email"))
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
}

#[tokio::test]
async fn test_rename_cannot_move_onto_an_existing_binding() {
    let db = setup_db().await;
    let form = create_form(&db, "Moves", None).await;
    let record = add_column(&db, form.id, "City", "text", 1, None).await;

    FormDetailService::new(db.clone())
        .bind_column(
            OWNER,
            BindingDraft {
                form_id: form.id,
                column_id: record.column.id,
                placement: Placement {
                    form_no: Some(2),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

    let err = ColumnService::new(db.clone())
        .rename_bound_column(
            OWNER,
            record.column.id,
            form.id,
            text_column("Town"),
            Placement {
                form_no: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::AlreadyBound { form_no: 2, .. }));
}

#[tokio::test]
async fn test_bindings_and_rules_are_owner_scoped() {
    let db = setup_db().await;
    let stranger = OWNER + 1;
    let form = create_form(&db, "Guarded", None).await;
    let record = add_column(&db, form.id, "Name", "text", 1, None).await;
    let details = FormDetailService::new(db.clone());

    let err = details
        .set_sequence(stranger, record.binding.id, 9)
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::BindingNotFound(_)));
    assert!(details.soft_delete_binding(stranger, record.binding.id).await.is_err());
    assert!(details.set_read_only(stranger, record.binding.id, true).await.is_err());
    assert!(details.binding_in_use(stranger, record.binding.id).await.is_err());
    assert!(matches!(
        details.next_form_no(stranger, form.id).await.unwrap_err(),
        SchemaError::FormNotFound(_)
    ));

    // a stranger cannot bind someone else's column into their own form
    let theirs = FormService::new(db.clone())
        .create_form(
            stranger,
            FormDraft {
                name: "Theirs".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = details
        .bind_column(
            stranger,
            BindingDraft {
                form_id: theirs.id,
                column_id: record.column.id,
                placement: Placement::default(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::ColumnNotFound(_)));

    let rules = ValidationRuleService::new(db.clone());
    let required = rules
        .list_kinds()
        .await
        .unwrap()
        .into_iter()
        .find(|k| k.name == "required")
        .unwrap();
    let draft = RuleDraft {
        validation_kind_id: required.id,
        form_id: form.id,
        column_id: record.column.id,
    };
    let err = rules.add_rule(stranger, draft.clone()).await.unwrap_err();
    assert!(matches!(err, SchemaError::FormNotFound(_)));

    let rule = rules.add_rule(OWNER, draft).await.unwrap();
    let err = rules.soft_delete_rule(stranger, rule.id).await.unwrap_err();
    assert!(matches!(err, SchemaError::RuleNotFound(_)));
    assert!(rules.update_rule(stranger, rule.id, required.id, false).await.is_err());
    assert!(rules.rules_for_form(stranger, form.id).await.is_err());
    assert_eq!(rules.rules_for_form(OWNER, form.id).await.unwrap().len(), 1);

    // the owner still sees the binding untouched
    let binding = details.get_binding(OWNER, record.binding.id).await.unwrap();
    assert_eq!(binding.sequence_no, record.binding.sequence_no);
    assert!(binding.is_active);
}
