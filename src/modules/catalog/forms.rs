//! Raw, untyped form input as it arrives from the client.

use indexmap::IndexMap;

/// A single form field before validation.
///
/// URL-encoded bodies may omit a field, send it once, or repeat it; the three
/// shapes are kept distinct until a rule decides how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Absent,
    Scalar(String),
    Sequence(Vec<String>),
}

impl FieldValue {
    /// Normalize to an ordered list: absent is empty, a scalar is one item.
    pub fn to_sequence(&self) -> Vec<String> {
        match self {
            FieldValue::Absent => Vec::new(),
            FieldValue::Scalar(value) => vec![value.clone()],
            FieldValue::Sequence(values) => values.clone(),
        }
    }

    /// Single-valued reading; a repeated field yields its first occurrence.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Absent => None,
            FieldValue::Scalar(value) => Some(value),
            FieldValue::Sequence(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        *self = match std::mem::take(self) {
            FieldValue::Absent => FieldValue::Scalar(value),
            FieldValue::Scalar(first) => FieldValue::Sequence(vec![first, value]),
            FieldValue::Sequence(mut values) => {
                values.push(value);
                FieldValue::Sequence(values)
            }
        };
    }
}

static ABSENT: FieldValue = FieldValue::Absent;

/// Submitted form fields keyed by name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForm {
    fields: IndexMap<String, FieldValue>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect decoded `name=value` pairs; repeated names become sequences.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::new();
        for (name, value) in pairs {
            form.fields.entry(name).or_default().push(value);
        }
        form
    }

    /// Builder used by callers that already hold a typed field value.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&ABSENT)
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.get(name).as_scalar()
    }

    pub fn sequence(&self, name: &str) -> Vec<String> {
        self.get(name).to_sequence()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawForm {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().map(|(k, v)| (k.into(), v.into())))
    }
}
