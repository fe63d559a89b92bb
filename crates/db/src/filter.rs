//! Query filters: a conjunction of per-field conditions.

use serde_json::Value;

use crate::Document;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => field.is_some_and(|actual| holds(actual, expected)),
            Condition::In(candidates) => field.is_some_and(|actual| {
                candidates.iter().any(|expected| holds(actual, expected))
            }),
        }
    }
}

/// Equality against an array field matches when the array contains the value.
fn holds(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) if !expected.is_array() => items.contains(expected),
        _ => actual == expected,
    }
}

/// Conjunction of field conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with a single equality clause.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Filter with a single membership clause.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::all().and_in(field, values)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.into(), Condition::Eq(value.into())));
        self
    }

    pub fn and_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((field.into(), Condition::In(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, condition)| condition.matches(document.get(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"name": "x"}))));
    }

    #[test]
    fn equality_on_scalar_field() {
        let filter = Filter::eq("status", "Available");
        assert!(filter.matches(&doc(json!({"status": "Available"}))));
        assert!(!filter.matches(&doc(json!({"status": "Loaned"}))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn equality_on_array_field_checks_membership() {
        let filter = Filter::eq("genre", "g-1");
        assert!(filter.matches(&doc(json!({"genre": ["g-0", "g-1"]}))));
        assert!(!filter.matches(&doc(json!({"genre": []}))));
    }

    #[test]
    fn membership_clause() {
        let filter = Filter::is_in("_id", ["a", "b"]);
        assert!(filter.matches(&doc(json!({"_id": "b"}))));
        assert!(!filter.matches(&doc(json!({"_id": "c"}))));
        assert!(!Filter::is_in("_id", Vec::<String>::new()).matches(&doc(json!({"_id": "a"}))));
    }

    #[test]
    fn clauses_are_conjunctive() {
        let filter = Filter::eq("book", "b-1").and_eq("status", "Available");
        assert!(filter.matches(&doc(json!({"book": "b-1", "status": "Available"}))));
        assert!(!filter.matches(&doc(json!({"book": "b-1", "status": "Loaned"}))));
    }
}
