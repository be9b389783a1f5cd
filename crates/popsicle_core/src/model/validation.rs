//! Field-level validation rules for popsicle records.
//!
//! # Invariants
//! - Validation is pure: no storage access, no logging.
//! - All failing rules are reported, not only the first one.

use super::popsicle::Popsicle;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NAME_MAX_CHARS: usize = 100;
pub const PRICE_MIN: i32 = 0;
pub const PRICE_MAX: i32 = 50;

/// One failed rule, serialized for HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub property_name: &'static str,
    pub error_message: String,
    pub attempted_value: Value,
}

impl ValidationFailure {
    fn new(property_name: &'static str, error_message: impl Into<String>, attempted: Value) -> Self {
        Self {
            property_name,
            error_message: error_message.into(),
            attempted_value: attempted,
        }
    }
}

/// Non-empty set of rule failures for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    failures: Vec<ValidationFailure>,
}

impl ValidationErrors {
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Returns whether any failure targets `property_name`.
    pub fn has_failure_for(&self, property_name: &str) -> bool {
        self.failures
            .iter()
            .any(|failure| failure.property_name == property_name)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.property_name, failure.error_message))
            .collect::<Vec<_>>();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl Error for ValidationErrors {}

/// Checks identifier, name, price and flavour rules.
pub fn validate_popsicle(popsicle: &Popsicle) -> Result<(), ValidationErrors> {
    let mut failures = Vec::new();

    if popsicle.id == 0 {
        failures.push(ValidationFailure::new(
            "Id",
            "Id should always be number",
            Value::from(popsicle.id),
        ));
    }

    if is_blank(&popsicle.name) {
        failures.push(ValidationFailure::new(
            "Name",
            "Name is required",
            Value::from(popsicle.name.as_str()),
        ));
    } else if popsicle.name.chars().count() > NAME_MAX_CHARS {
        failures.push(ValidationFailure::new(
            "Name",
            format!("Name must not exceed {NAME_MAX_CHARS} characters"),
            Value::from(popsicle.name.as_str()),
        ));
    }

    if !(PRICE_MIN..=PRICE_MAX).contains(&popsicle.price) {
        failures.push(ValidationFailure::new(
            "Price",
            format!(
                "'Price' must be between {PRICE_MIN} and {PRICE_MAX}. You entered {}.",
                popsicle.price
            ),
            Value::from(popsicle.price),
        ));
    }

    if is_blank(&popsicle.flavour) {
        failures.push(ValidationFailure::new(
            "Flavour",
            "'Flavour' must not be empty.",
            Value::from(popsicle.flavour.as_str()),
        ));
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { failures })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
