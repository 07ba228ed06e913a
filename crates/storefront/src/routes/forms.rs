//! Form field errors and shared field validation.

use std::collections::BTreeMap;

use serde::Deserialize;

use emporium_core::Email;

use crate::models::ShippingDetails;

/// Longest free-text value accepted in a form field.
pub const MAX_FIELD_LENGTH: usize = 200;

/// Validation messages keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a message to a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All messages for a field joined into one line, if any.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|messages| messages.join(" "))
    }

    /// Check a required text field.
    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else {
            self.limit(field, value);
        }
    }

    /// Check an optional text field against the length cap.
    pub fn limit(&mut self, field: &'static str, value: &str) {
        if value.chars().count() > MAX_FIELD_LENGTH {
            self.add(
                field,
                format!("Ensure this value has at most {MAX_FIELD_LENGTH} characters."),
            );
        }
    }
}

/// Raw shipping form fields as submitted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ShippingFields {
    pub full_name: String,
    pub email: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ShippingFields {
    /// Trimmed details; blank state and zipcode become `None`.
    #[must_use]
    pub fn to_details(&self) -> ShippingDetails {
        ShippingDetails {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            address1: self.address1.trim().to_string(),
            address2: self.address2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: optional(&self.state),
            zipcode: optional(&self.zipcode),
            country: self.country.trim().to_string(),
        }
    }
}

/// Validate shipping details.
///
/// Name, email, first address line, city, and country are required; the
/// email must be well formed.
#[must_use]
pub fn validate_shipping(details: &ShippingDetails) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.require("full_name", &details.full_name);
    errors.require("email", &details.email);
    if !details.email.is_empty()
        && let Err(e) = Email::parse(&details.email)
    {
        errors.add("email", e.to_string());
    }
    errors.require("address1", &details.address1);
    errors.limit("address2", &details.address2);
    errors.require("city", &details.city);
    errors.limit("state", details.state.as_deref().unwrap_or_default());
    errors.limit("zipcode", details.zipcode.as_deref().unwrap_or_default());
    errors.require("country", &details.country);
    errors
}
