use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::errors::{SchemaError, SchemaResult, SubmitterError, SubmitterResult};
use crate::form_types::decimal_to_minor;

/// Input sanitisation for administrator-supplied definitions and submitter identifiers.
pub struct ValidationService;

impl ValidationService {
    pub fn validate_form_name(name: &str) -> SchemaResult<String> {
        Self::validate_label("Form name", name, 100)
    }

    pub fn validate_column_name(name: &str) -> SchemaResult<String> {
        Self::validate_label("Column name", name, 100)
    }

    pub fn validate_option_label(label: &str) -> SchemaResult<String> {
        Self::validate_label("Option label", label, 200)
    }

    pub fn validate_data_type(data_type: &str) -> SchemaResult<String> {
        let trimmed = data_type.trim();
        if trimmed.is_empty() {
            return Err(SchemaError::InvalidInput(
                "Data type cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > 30 {
            return Err(SchemaError::InvalidInput(
                "Data type is too long (max 30 characters)".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    /// Fee in major units to minor units. `None` and zero both mean free.
    pub fn validate_fee(fee: Option<Decimal>) -> SchemaResult<Option<i64>> {
        let Some(fee) = fee else {
            return Ok(None);
        };
        if fee.is_sign_negative() {
            return Err(SchemaError::InvalidInput(
                "Fee cannot be negative".to_string(),
            ));
        }
        decimal_to_minor(fee)
            .map(Some)
            .ok_or_else(|| SchemaError::InvalidInput("Fee is out of range".to_string()))
    }

    /// Submitters are identified by an email address or a phone number.
    pub fn validate_identifier(identifier: &str) -> SubmitterResult<String> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(SubmitterError::InvalidIdentifier(
                "Identifier cannot be empty".to_string(),
            ));
        }
        if Self::is_email(trimmed) {
            return Ok(trimmed.to_lowercase());
        }
        if Self::is_phone(trimmed) {
            return Ok(trimmed.replace([' ', '-'], ""));
        }
        Err(SubmitterError::InvalidIdentifier(format!(
            "'{}' is neither an email address nor a phone number",
            trimmed
        )))
    }

    /// Canonical form used for lookups. Unrecognised input is only trimmed.
    pub fn normalize_identifier(identifier: &str) -> String {
        Self::validate_identifier(identifier).unwrap_or_else(|_| identifier.trim().to_string())
    }

    pub fn is_email(value: &str) -> bool {
        EMAIL_RE.is_match(value.trim())
    }

    pub fn is_phone(value: &str) -> bool {
        PHONE_RE.is_match(&value.trim().replace([' ', '-'], ""))
    }

    pub fn is_url(value: &str) -> bool {
        URL_RE.is_match(value.trim())
    }

    fn validate_label(what: &str, value: &str, max: usize) -> SchemaResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SchemaError::InvalidInput(format!("{} cannot be empty", what)));
        }
        if trimmed.chars().count() > max {
            return Err(SchemaError::InvalidInput(format!(
                "{} is too long (max {} characters)",
                what, max
            )));
        }
        if trimmed.contains(['<', '>']) {
            return Err(SchemaError::InvalidInput(format!(
                "{} cannot contain angle brackets",
                what
            )));
        }
        Ok(trimmed.to_string())
    }
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern compiles"));

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern compiles"));
