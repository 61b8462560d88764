//! Reference-field resolution.
//!
//! Reference fields store a foreign identifier; before display those values
//! are swapped for a label read from the referenced table.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::record::{coerce_text, Record};

pub use memory::InMemoryLabelSource;

pub const REFERENCE_FIELD_TYPE: &str = "reference";
pub const DEFAULT_DISPLAY_FIELD: &str = "name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_display_field: Option<String>,
}

impl FieldMeta {
    pub fn reference(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: REFERENCE_FIELD_TYPE.to_string(),
            reference_table: Some(table.into()),
            reference_display_field: None,
        }
    }

    /// Referenced table, when this is a resolvable reference field
    pub fn reference_table(&self) -> Option<&str> {
        if self.field_type != REFERENCE_FIELD_TYPE {
            return None;
        }
        self.reference_table.as_deref().filter(|t| !t.is_empty())
    }

    pub fn display_field(&self) -> &str {
        self.reference_display_field
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_FIELD)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Unknown reference table: {0}")]
    UnknownTable(String),
}

/// Batch lookup of display labels by identifier
#[async_trait]
pub trait LabelSource: Send + Sync {
    /// Returns labels for the ids found in `table`, scoped to `tenant_id`.
    /// Ids without a row, or whose row has no display value, are absent.
    async fn fetch_labels(
        &self,
        tenant_id: &str,
        table: &str,
        display_field: &str,
        ids: &[String],
    ) -> Result<HashMap<String, Value>, LabelError>;
}

/// Replace reference identifiers with their labels.
///
/// Returns resolved copies; the input records are left untouched. Each
/// reference field is fetched in one batch and fields are fetched
/// concurrently. Failed lookups leave the field as-is and are reported to
/// `sink`.
pub async fn resolve_reference_fields<S>(
    tenant_id: &str,
    records: &[Record],
    fields: &[FieldMeta],
    source: &S,
    sink: &dyn DiagnosticSink,
) -> Vec<Record>
where
    S: LabelSource + ?Sized,
{
    let mut resolved = records.to_vec();

    if tenant_id.is_empty() {
        tracing::warn!("No tenant id provided for reference field resolution");
        return resolved;
    }

    let lookups: Vec<(&FieldMeta, &str, Vec<String>)> = fields
        .iter()
        .filter_map(|f| f.reference_table().map(|table| (f, table)))
        .map(|(f, table)| (f, table, unique_ids(records, &f.name)))
        .filter(|(_, _, ids)| !ids.is_empty())
        .collect();

    if lookups.is_empty() {
        return resolved;
    }

    let results = join_all(
        lookups
            .iter()
            .map(|(field, table, ids)| source.fetch_labels(tenant_id, table, field.display_field(), ids)),
    )
    .await;

    for ((field, table, ids), result) in lookups.iter().zip(results) {
        let labels = match result {
            Ok(labels) => labels,
            Err(e) => {
                sink.emit(&Diagnostic::LabelLookupFailed {
                    table: table.to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        for id in ids.iter().filter(|id| !labels.contains_key(*id)) {
            sink.emit(&Diagnostic::ReferenceUnresolved {
                field: field.name.clone(),
                value: id.clone(),
            });
        }

        let mut count = 0;
        for record in &mut resolved {
            let Some(id) = record.field(&field.name).and_then(reference_id) else {
                continue;
            };
            if let Some(label) = labels.get(&id) {
                record.set_field(field.name.clone(), label.clone());
                count += 1;
            }
        }
        tracing::debug!("Resolved {} values for reference field {}", count, field.name);
    }

    resolved
}

/// Truthy reference values as identifiers; null, false, zero and empty are skipped
fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => coerce_text(other).map(|t| t.into_owned()).filter(|t| !t.is_empty()),
    }
}

/// Distinct identifiers for a field, in first-seen order
fn unique_ids(records: &[Record], field: &str) -> Vec<String> {
    let mut ids: Vec<String> = vec![];
    for id in records.iter().filter_map(|r| r.field(field).and_then(reference_id)) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
