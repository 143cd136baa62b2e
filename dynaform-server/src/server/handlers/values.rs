//! Turning request bodies into raw submissions.

use std::collections::{BTreeMap, HashMap};

use axum::extract::Multipart;
use dynaform::form_types::{RawSubmission, RawValue, UploadedFile};
use serde_json::Value;

use crate::server::error::ApiError;

/// Multipart field holding the non-file values as a JSON object keyed by column id.
pub const COLUMN_VALUES_FIELD: &str = "columnValues";

pub fn raw_from_json(values: BTreeMap<i32, Value>) -> RawSubmission {
    values
        .into_iter()
        .map(|(col_id, value)| (col_id, RawValue::from(value)))
        .collect()
}

/// A multipart body split into column values and the remaining named fields.
#[derive(Debug, Default)]
pub struct MultipartSubmission {
    pub fields: HashMap<String, String>,
    pub raw: RawSubmission,
}

impl MultipartSubmission {
    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("{} is required", name)))
    }

    pub fn required_i32(&self, name: &str) -> Result<i32, ApiError> {
        self.required(name)?
            .trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("{} must be an integer", name)))
    }
}

/// File parts are keyed by column id in their field name; so are plain text parts.
/// A file part wins over a `columnValues` entry for the same column.
pub async fn read_multipart(mut multipart: Multipart) -> Result<MultipartSubmission, ApiError> {
    let mut body = MultipartSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let col_id = name.parse::<i32>().map_err(|_| {
                ApiError::bad_request(format!("file field '{}' is not a column id", name))
            })?;
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?.to_vec();
            body.raw.insert(
                col_id,
                RawValue::File(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                }),
            );
            continue;
        }

        let text = field.text().await?;
        if name == COLUMN_VALUES_FIELD {
            let values: BTreeMap<i32, Value> = serde_json::from_str(&text).map_err(|e| {
                ApiError::bad_request(format!("{} must be a JSON object keyed by column id: {}", COLUMN_VALUES_FIELD, e))
            })?;
            for (col_id, value) in values {
                body.raw.entry(col_id).or_insert_with(|| RawValue::from(value));
            }
        } else if let Ok(col_id) = name.parse::<i32>() {
            body.raw.insert(col_id, RawValue::Text(text));
        } else {
            body.fields.insert(name, text);
        }
    }

    Ok(body)
}
