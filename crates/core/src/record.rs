//! Record projection.
//!
//! Hosts hand the engine arbitrary JSON objects. A `FieldMap` names the four
//! fields the engine cares about and resolves them once per record, so the
//! hot filtering path never looks fields up by name.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category assigned to records whose category field is missing or falsy.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Canonical string rendering of the identity field (numbers as decimal text, missing as "").
pub type RecordId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    pub secondary: Option<String>,
    /// The host's untouched object, handed back on item selection.
    #[serde(skip)]
    pub raw: Arc<Value>,
}

impl Record {
    /// Build a record directly from its projected parts. `raw` mirrors the parts
    /// under the default field names.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        let (id, name, category) = (id.into(), name.into(), category.into());
        let raw = serde_json::json!({ "id": id, "name": name, "category": category });
        Self { id, name, category, secondary: None, raw: Arc::new(raw) }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        let secondary = secondary.into();
        if let Some(obj) = Arc::make_mut(&mut self.raw).as_object_mut() {
            obj.insert("secondary".into(), Value::String(secondary.clone()));
        }
        self.secondary = Some(secondary);
        self
    }
}

/// Turns a raw host value into a `Record`.
pub trait Projector: Send + Sync {
    fn project(&self, raw: Value) -> Record;

    fn project_all(&self, raws: Vec<Value>) -> Vec<Record> {
        raws.into_iter().map(|raw| self.project(raw)).collect()
    }
}

/// Names of the configured record fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldMap {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Optional friendly identifier, substring-matched once the query is long enough.
    pub secondary: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self { id: "id".into(), name: "name".into(), category: "category".into(), secondary: None }
    }
}

impl FieldMap {
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self { id: id.into(), name: name.into(), category: category.into(), secondary: None }
    }

    pub fn with_secondary(mut self, field: &str) -> Self {
        self.secondary = Some(field.into());
        self
    }
}

impl Projector for FieldMap {
    fn project(&self, raw: Value) -> Record {
        let id = scalar_text(raw.get(&self.id)).unwrap_or_default();
        let name = scalar_text(raw.get(&self.name)).unwrap_or_default();
        let category = category_of(raw.get(&self.category));
        let secondary = self.secondary.as_deref().and_then(|f| scalar_text(raw.get(f)));
        Record { id, name, category, secondary, raw: Arc::new(raw) }
    }
}

/// The bucket a category lands in once `all_label` is reserved for the total.
/// A real category spelled like the All label is counted and grouped as `UNCATEGORIZED`.
pub fn bucket_label<'a>(category: &'a str, all_label: &str) -> &'a str {
    if category == all_label { UNCATEGORIZED } else { category }
}

/// Resolve a category value, mapping missing and falsy values to `UNCATEGORIZED`.
pub fn category_of(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) | Some(Value::Bool(false)) => UNCATEGORIZED.to_string(),
        Some(Value::String(s)) if s.is_empty() => UNCATEGORIZED.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => UNCATEGORIZED.to_string(),
        other => scalar_text(other).unwrap_or_else(|| UNCATEGORIZED.to_string()),
    }
}

fn scalar_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
