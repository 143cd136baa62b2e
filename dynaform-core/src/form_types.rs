use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Data type of a column. Stored as free text so administrators can introduce
/// types this crate does not know about; those fall back to plain text handling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DataType {
    Text,
    Number,
    Date,
    Email,
    Phone,
    Boolean,
    Dropdown,
    Checkbox,
    Radio,
    File,
    Other(String),
}

impl DataType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "textarea" => DataType::Text,
            "number" | "numeric" | "int" | "integer" | "decimal" => DataType::Number,
            "date" => DataType::Date,
            "email" => DataType::Email,
            "phone" | "tel" | "mobile" => DataType::Phone,
            "boolean" | "bool" | "toggle" => DataType::Boolean,
            "dropdown" | "select" => DataType::Dropdown,
            "checkbox" => DataType::Checkbox,
            "radio" => DataType::Radio,
            "file" | "pdf" | "upload" => DataType::File,
            _ => DataType::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Boolean => "boolean",
            DataType::Dropdown => "dropdown",
            DataType::Checkbox => "checkbox",
            DataType::Radio => "radio",
            DataType::File => "file",
            DataType::Other(raw) => raw.as_str(),
        }
    }

    /// Option-bearing types, paired with their option set kind.
    pub fn option_kind(&self) -> Option<OptionKind> {
        match self {
            DataType::Dropdown => Some(OptionKind::Dropdown),
            DataType::Checkbox => Some(OptionKind::Checkbox),
            DataType::Radio => Some(OptionKind::Radio),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Dropdown,
    Checkbox,
    Radio,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Dropdown => "dropdown",
            OptionKind::Checkbox => "checkbox",
            OptionKind::Radio => "radio",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dropdown" => Some(OptionKind::Dropdown),
            "checkbox" => Some(OptionKind::Checkbox),
            "radio" => Some(OptionKind::Radio),
            _ => None,
        }
    }
}

/// Catalog validation kinds understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Required,
    Email,
    Numeric,
    Phone,
    Date,
    Url,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Email => "email",
            RuleKind::Numeric => "numeric",
            RuleKind::Phone => "phone",
            RuleKind::Date => "date",
            RuleKind::Url => "url",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "required" => Some(RuleKind::Required),
            "email" => Some(RuleKind::Email),
            "numeric" | "number" => Some(RuleKind::Numeric),
            "phone" => Some(RuleKind::Phone),
            "date" => Some(RuleKind::Date),
            "url" => Some(RuleKind::Url),
            _ => None,
        }
    }
}

/// One column of an assembled form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub col_id: i32,
    pub binding_id: i32,
    pub column_name: String,
    pub data_type: DataType,
    pub sequence_no: i32,
    pub form_no: i32,
    pub read_only: bool,
    pub required: bool,
    pub validations: Vec<RuleKind>,
    pub option_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub form_id: i32,
    pub form_name: String,
    pub fee: Decimal,
    pub columns: Vec<ColumnDescriptor>,
}

impl FormSchema {
    pub fn column(&self, col_id: i32) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.col_id == col_id)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A file payload as received from the client.
#[derive(Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
        let by_name = self.file_name.to_ascii_lowercase().ends_with(".pdf");
        by_type || by_name || self.bytes.starts_with(b"%PDF")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Boolean(bool),
    Number(f64),
    File(UploadedFile),
}

impl RawValue {
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::File(f) => f.bytes.is_empty(),
            RawValue::Boolean(_) | RawValue::Number(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => RawValue::Boolean(b),
            serde_json::Value::Number(n) => RawValue::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Null => RawValue::Text(String::new()),
            serde_json::Value::Array(items) => RawValue::Text(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => RawValue::Text(other.to_string()),
        }
    }
}

/// Client-supplied values keyed by column id.
pub type RawSubmission = BTreeMap<i32, RawValue>;

/// A validated value ready to persist. File payloads are still in memory and
/// are swapped for a storage reference before anything reaches the database.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedValue {
    Text(String),
    File(UploadedFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEntry {
    pub col_id: i32,
    pub value: ValidatedValue,
}

/// Minor units (paise) to a two-place decimal amount.
pub fn minor_to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Decimal amount to minor units, rounding half away from zero.
pub fn decimal_to_minor(amount: Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    (amount.round_dp(2) * Decimal::from(100)).trunc().to_i64()
}
