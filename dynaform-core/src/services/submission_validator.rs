use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use tokio::task;
use tracing::warn;

use crate::errors::{SubmissionError, SubmissionResult};
use crate::form_types::{
    ColumnDescriptor, DataType, FormSchema, RawSubmission, RawValue, RuleKind, UploadedFile,
    ValidatedEntry, ValidatedValue,
};
use crate::services::ValidationService;

/// Accepted page range for PDF uploads.
pub const PDF_PAGE_RANGE: RangeInclusive<usize> = 2..=3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required column must be present (create and paid submissions).
    Complete,
    /// Only supplied columns are checked (updates).
    Partial,
}

pub struct SubmissionValidator;

impl SubmissionValidator {
    /// Validate raw values against a schema. The first failing column, in
    /// schema order, rejects the whole submission. Unknown column ids are ignored.
    pub async fn validate(
        schema: &FormSchema,
        raw: &RawSubmission,
        mode: ValidationMode,
    ) -> SubmissionResult<Vec<ValidatedEntry>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for column in &schema.columns {
            if !seen.insert(column.col_id) {
                continue;
            }
            let result = Self::validate_column(column, raw.get(&column.col_id), mode).await;
            match result {
                Ok(Some(value)) => entries.push(ValidatedEntry {
                    col_id: column.col_id,
                    value,
                }),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "Rejected submission for form {}: {}",
                        schema.form_id, err
                    );
                    return Err(err);
                }
            }
        }

        Ok(entries)
    }

    async fn validate_column(
        column: &ColumnDescriptor,
        value: Option<&RawValue>,
        mode: ValidationMode,
    ) -> SubmissionResult<Option<ValidatedValue>> {
        let col_id = column.col_id;
        let Some(value) = value else {
            if column.required && mode == ValidationMode::Complete {
                return Err(SubmissionError::MissingRequiredField(col_id));
            }
            return Ok(None);
        };

        if value.is_blank() {
            if column.required {
                return Err(SubmissionError::MissingRequiredField(col_id));
            }
            return Ok(match mode {
                ValidationMode::Complete => None,
                ValidationMode::Partial => Some(ValidatedValue::Text(String::new())),
            });
        }

        if column.data_type == DataType::File {
            let RawValue::File(file) = value else {
                return Err(invalid(col_id, "expected a file upload"));
            };
            check_file(col_id, file).await?;
            return Ok(Some(ValidatedValue::File(file.clone())));
        }

        if matches!(value, RawValue::File(_)) {
            return Err(invalid(col_id, "file uploads are only accepted for file columns"));
        }

        let text = coerce(column, value)?;
        for rule in &column.validations {
            check_rule(col_id, *rule, &text)?;
        }
        Ok(Some(ValidatedValue::Text(text)))
    }
}

fn invalid(col_id: i32, reason: impl Into<String>) -> SubmissionError {
    SubmissionError::InvalidValue {
        col_id,
        reason: reason.into(),
    }
}

fn plain_text(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Boolean(b) => bool_token(*b).to_string(),
        RawValue::Number(n) => format_number(*n),
        RawValue::File(f) => f.file_name.clone(),
    }
}

fn bool_token(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Type-directed normalisation to the stored text form.
fn coerce(column: &ColumnDescriptor, value: &RawValue) -> SubmissionResult<String> {
    let col_id = column.col_id;
    match &column.data_type {
        DataType::Boolean => match value {
            RawValue::Boolean(b) => Ok(bool_token(*b).to_string()),
            RawValue::Number(n) if *n == 0.0 || *n == 1.0 => Ok(bool_token(*n == 1.0).to_string()),
            RawValue::Text(s) => parse_bool(s)
                .map(|b| bool_token(b).to_string())
                .ok_or_else(|| invalid(col_id, format!("'{}' is not a boolean", s.trim()))),
            _ => Err(invalid(col_id, "expected a boolean")),
        },
        DataType::Number => {
            let text = plain_text(value);
            text.parse::<f64>()
                .map(|_| text.clone())
                .map_err(|_| invalid(col_id, format!("'{}' is not a number", text)))
        }
        DataType::Date => {
            let text = plain_text(value);
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(|d| d.format("%Y-%m-%d").to_string())
                .map_err(|_| invalid(col_id, format!("'{}' is not a date (YYYY-MM-DD)", text)))
        }
        DataType::Email => {
            let text = plain_text(value);
            if ValidationService::is_email(&text) {
                Ok(text)
            } else {
                Err(invalid(col_id, format!("'{}' is not an email address", text)))
            }
        }
        DataType::Phone => {
            let text = plain_text(value);
            if ValidationService::is_phone(&text) {
                Ok(text)
            } else {
                Err(invalid(col_id, format!("'{}' is not a phone number", text)))
            }
        }
        DataType::Dropdown | DataType::Radio => {
            let text = plain_text(value);
            if column.option_values.is_empty() || column.option_values.contains(&text) {
                Ok(text)
            } else {
                Err(invalid(col_id, format!("'{}' is not one of the options", text)))
            }
        }
        DataType::Checkbox => {
            if let RawValue::Boolean(b) = value {
                if column.option_values.is_empty() {
                    return Ok(bool_token(*b).to_string());
                }
            }
            let text = plain_text(value);
            let picked: Vec<&str> = text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if !column.option_values.is_empty() {
                if let Some(bad) = picked
                    .iter()
                    .find(|p| !column.option_values.iter().any(|o| o.as_str() == **p))
                {
                    return Err(invalid(col_id, format!("'{}' is not one of the options", bad)));
                }
            }
            Ok(picked.join(","))
        }
        DataType::Text | DataType::File | DataType::Other(_) => Ok(plain_text(value)),
    }
}

fn check_rule(col_id: i32, rule: RuleKind, text: &str) -> SubmissionResult<()> {
    let ok = match rule {
        RuleKind::Required => !text.trim().is_empty(),
        RuleKind::Email => ValidationService::is_email(text),
        RuleKind::Numeric => text.trim().parse::<f64>().is_ok(),
        RuleKind::Phone => ValidationService::is_phone(text),
        RuleKind::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok(),
        RuleKind::Url => ValidationService::is_url(text),
    };
    if ok {
        Ok(())
    } else {
        Err(invalid(col_id, format!("'{}' fails the {} rule", text, rule.as_str())))
    }
}

/// PDFs must have an acceptable page count; other file types pass through.
async fn check_file(col_id: i32, file: &UploadedFile) -> SubmissionResult<()> {
    if !file.is_pdf() {
        return Ok(());
    }

    let bytes = file.bytes.clone();
    let pages = task::spawn_blocking(move || pdf_page_count(&bytes))
        .await
        .map_err(|e| SubmissionError::FileValidationError {
            col_id,
            reason: format!("PDF inspection task failed: {}", e),
        })?
        .map_err(|reason| SubmissionError::FileValidationError { col_id, reason })?;

    if !PDF_PAGE_RANGE.contains(&pages) {
        return Err(SubmissionError::FilePageCountInvalid { col_id, pages });
    }
    Ok(())
}

pub fn pdf_page_count(bytes: &[u8]) -> Result<usize, String> {
    lopdf::Document::load_mem(bytes)
        .map(|doc| doc.get_pages().len())
        .map_err(|e| format!("unreadable PDF: {}", e))
}
