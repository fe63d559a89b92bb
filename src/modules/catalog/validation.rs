//! Field sanitization, and the bridge from `validator` failures to form errors.
//!
//! A [`Rule`] reads one field from a [`RawForm`] and trims it; checks run on
//! the trimmed value while the form is echoed back escaped. [`Rules::clean`]
//! yields both shapes so a draft can be validated on one and rendered from
//! the other. [`field_errors`] flattens [`ValidationErrors`] in rule order.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

use super::forms::RawForm;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    #[serde(rename = "msg")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Sanitization for one field.
#[derive(Debug, Clone)]
pub struct Rule {
    field: &'static str,
    each: bool,
    trim: bool,
    escape: bool,
}

impl Rule {
    /// Rule over a single-valued field.
    pub fn field(field: &'static str) -> Self {
        Self {
            field,
            each: false,
            trim: false,
            escape: false,
        }
    }

    /// Rule applied to every item of a list field.
    pub fn each(field: &'static str) -> Self {
        Self {
            each: true,
            ..Self::field(field)
        }
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn escape(mut self) -> Self {
        self.escape = true;
        self
    }

    /// The value checks see, and the value echoed back.
    fn clean(&self, raw: &str) -> (String, String) {
        let value = if self.trim { raw.trim() } else { raw };
        let echoed = if self.escape {
            escape(value)
        } else {
            value.to_string()
        };
        (value.to_string(), echoed)
    }
}

/// Field values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitized {
    texts: IndexMap<&'static str, String>,
    lists: IndexMap<&'static str, Vec<String>>,
}

impl Sanitized {
    /// Single value; empty when the field had no rule or no input.
    pub fn text(&self, field: &str) -> String {
        self.texts.get(field).cloned().unwrap_or_default()
    }

    pub fn list(&self, field: &str) -> Vec<String> {
        self.lists.get(field).cloned().unwrap_or_default()
    }
}

/// A form after its rules ran.
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    /// Trimmed values, before escaping.
    pub checked: Sanitized,
    /// Trimmed and escaped values.
    pub echoed: Sanitized,
}

/// An ordered rule set.
#[derive(Debug, Clone)]
pub struct Rules(Vec<Rule>);

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    /// Field names in rule order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|rule| rule.field)
    }

    pub fn clean(&self, form: &RawForm) -> Cleaned {
        let mut cleaned = Cleaned::default();

        for rule in &self.0 {
            if rule.each {
                let (checked, echoed): (Vec<_>, Vec<_>) = form
                    .sequence(rule.field)
                    .iter()
                    .map(|item| rule.clean(item))
                    .unzip();
                cleaned.checked.lists.insert(rule.field, checked);
                cleaned.echoed.lists.insert(rule.field, echoed);
            } else {
                let raw = form.scalar(rule.field).unwrap_or_default();
                let (checked, echoed) = rule.clean(raw);
                cleaned.checked.texts.insert(rule.field, checked);
                cleaned.echoed.texts.insert(rule.field, echoed);
            }
        }

        cleaned
    }
}

/// Flatten `errors` into form errors, ordered by `fields`.
pub fn field_errors<'a>(
    fields: impl IntoIterator<Item = &'a str>,
    errors: &ValidationErrors,
) -> Vec<FieldError> {
    let by_field = errors.field_errors();
    fields
        .into_iter()
        .filter_map(|field| by_field.get(field).map(|failures| (field, failures)))
        .flat_map(|(field, failures)| {
            failures.iter().map(move |failure| {
                let message = failure.message.as_ref().unwrap_or(&failure.code);
                FieldError::new(field, message.to_string())
            })
        })
        .collect()
}

/// Non-empty after trimming.
pub fn filled(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Empty, or an ISO-8601 date.
pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || parse_iso_date(value).is_some() {
        return Ok(());
    }
    Err(ValidationError::new("iso_date").with_message(Cow::Borrowed("Invalid date.")))
}

/// Replace markup-sensitive characters with HTML entities.
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Parse an ISO-8601 calendar date or date-time, keeping the date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
                .ok()
                .map(|dt| dt.date())
        })
}
