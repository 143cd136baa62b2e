#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dynaform::collaborators::{AssetStore, GatewayOrder, Messenger, PaymentGateway};
use dynaform::database::entities::{forms, validation_kinds};
use dynaform::database::test_utils::setup_test_db;
use dynaform::errors::StorageError;
use dynaform::form_types::{OptionKind, RawValue, UploadedFile};
use dynaform::services::column_service::{BoundColumnRecord, ColumnDraft};
use dynaform::services::form_detail_service::Placement;
use dynaform::services::form_service::FormDraft;
use dynaform::services::option_service::OptionDraft;
use dynaform::services::validation_rule_service::RuleDraft;
use dynaform::services::{ColumnService, FormService, OptionService, ValidationRuleService};
use lopdf::{dictionary, Document, Object, Stream};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

pub const OWNER: i32 = 1;
pub const SECRET: &str = "test_key_secret";

pub async fn setup_db() -> DatabaseConnection {
    setup_test_db().await.unwrap()
}

pub async fn create_form(db: &DatabaseConnection, name: &str, fee: Option<i64>) -> forms::Model {
    FormService::new(db.clone())
        .create_form(
            OWNER,
            FormDraft {
                name: name.to_string(),
                fee: fee.map(Decimal::from),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

/// Create a column and bind it into section `form_no` of the form.
pub async fn add_column(
    db: &DatabaseConnection,
    form_id: i32,
    name: &str,
    data_type: &str,
    form_no: i32,
    sequence_no: Option<i32>,
) -> BoundColumnRecord {
    ColumnService::new(db.clone())
        .create_bound_column(
            OWNER,
            form_id,
            ColumnDraft {
                name: name.to_string(),
                data_type: data_type.to_string(),
            },
            Placement {
                sequence_no,
                form_no: Some(form_no),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

pub async fn add_rule(db: &DatabaseConnection, form_id: i32, column_id: i32, kind: &str) {
    let kind = validation_kinds::Entity::find()
        .filter(validation_kinds::Column::Name.eq(kind))
        .one(db)
        .await
        .unwrap()
        .expect("seeded validation kind");
    ValidationRuleService::new(db.clone())
        .add_rule(
            OWNER,
            RuleDraft {
                validation_kind_id: kind.id,
                form_id,
                column_id,
            },
        )
        .await
        .unwrap();
}

pub async fn add_options(
    db: &DatabaseConnection,
    form_id: i32,
    column_id: i32,
    kind: OptionKind,
    labels: &[&str],
) {
    let service = OptionService::new(db.clone());
    for label in labels {
        service
            .add_option(
                OWNER,
                OptionDraft {
                    column_id,
                    form_id,
                    kind,
                    label: label.to_string(),
                },
            )
            .await
            .unwrap();
    }
}

/// The free form F1: C1 required text, C2 optional dropdown {A, B}.
pub struct FreeForm {
    pub form: forms::Model,
    pub c1: i32,
    pub c2: i32,
}

pub async fn free_form(db: &DatabaseConnection) -> FreeForm {
    let form = create_form(db, "Free Form", None).await;
    let c1 = add_column(db, form.id, "C1", "text", 1, Some(1)).await.column.id;
    let c2 = add_column(db, form.id, "C2", "dropdown", 1, Some(2)).await.column.id;
    add_rule(db, form.id, c1, "required").await;
    add_options(db, form.id, c2, OptionKind::Dropdown, &["A", "B"]).await;
    FreeForm { form, c1, c2 }
}

/// The paid form F2: fee 500 with one required text column.
pub async fn paid_form(db: &DatabaseConnection) -> (forms::Model, i32) {
    let form = create_form(db, "Paid Form", Some(500)).await;
    let c1 = add_column(db, form.id, "Full name", "text", 1, Some(1)).await.column.id;
    add_rule(db, form.id, c1, "required").await;
    (form, c1)
}

/// Stores files in memory and hands back `mem://` references.
#[derive(Default)]
pub struct MemoryAssetStore {
    pub stored: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(
        &self,
        file_name: &str,
        _content_type: Option<&str>,
        _bytes: &[u8],
    ) -> Result<String, StorageError> {
        let mut stored = self.stored.lock().unwrap();
        let reference = format!("mem://{}/{}", stored.len() + 1, file_name);
        stored.push(reference.clone());
        Ok(reference)
    }
}

pub fn memory_assets() -> Arc<MemoryAssetStore> {
    Arc::new(MemoryAssetStore::default())
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, recipient: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), body.to_string()));
        Ok(())
    }
}

impl RecordingMessenger {
    /// The six digit code from the most recent message.
    pub fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.last().expect("a message was sent");
        body.split_whitespace()
            .find(|w| w.trim_end_matches('.').len() == 6 && w.trim_end_matches('.').chars().all(|c| c.is_ascii_digit()))
            .map(|w| w.trim_end_matches('.').to_string())
            .expect("message carries a code")
    }
}

pub struct FailingMessenger;

#[async_trait]
impl Messenger for FailingMessenger {
    async fn send(&self, _recipient: &str, _body: &str) -> anyhow::Result<()> {
        anyhow::bail!("provider unavailable")
    }
}

pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder> {
        Ok(GatewayOrder {
            order_id: "order_stub_1".to_string(),
            amount_minor,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }
}

/// A minimal PDF with `pages` blank pages.
pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 595_i64.into(), 842_i64.into()],
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn pdf_value(pages: usize) -> RawValue {
    RawValue::File(UploadedFile {
        file_name: format!("resume-{}p.pdf", pages),
        content_type: Some("application/pdf".to_string()),
        bytes: pdf_with_pages(pages),
    })
}
