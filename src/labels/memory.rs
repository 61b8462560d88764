use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::record::{coerce_text, Record};

use super::{LabelError, LabelSource};

pub const TENANT_FIELD: &str = "tenant_id";
pub const ID_FIELD: &str = "id";

/// Label source over tables held in memory.
///
/// Rows carrying a `tenant_id` are only visible to that tenant; rows without
/// one are shared.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLabelSource {
    tables: HashMap<String, Vec<Record>>,
}

impl InMemoryLabelSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Record>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    pub fn insert_table(&mut self, name: impl Into<String>, rows: Vec<Record>) {
        self.tables.insert(name.into(), rows);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn visible_to(row: &Record, tenant_id: &str) -> bool {
    match row.get(TENANT_FIELD).and_then(coerce_text) {
        Some(owner) => owner == tenant_id,
        None => true,
    }
}

#[async_trait]
impl LabelSource for InMemoryLabelSource {
    async fn fetch_labels(
        &self,
        tenant_id: &str,
        table: &str,
        display_field: &str,
        ids: &[String],
    ) -> Result<HashMap<String, Value>, LabelError> {
        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| LabelError::UnknownTable(table.to_string()))?;

        let mut labels = HashMap::new();
        for row in rows.iter().filter(|r| visible_to(r, tenant_id)) {
            let id = row.identity(ID_FIELD);
            if !ids.contains(&id) {
                continue;
            }
            if let Some(label) = row.field(display_field).filter(|v| !v.is_null()) {
                labels.insert(id, label.clone());
            }
        }
        Ok(labels)
    }
}
