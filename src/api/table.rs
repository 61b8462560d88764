use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AppConfig;
use crate::diagnostics::{self, SharedSink, TracingSink};
use crate::error::ApiError;
use crate::filter::{check_limits, matches_filters, sort_by_order, FilterGroup};
use crate::labels::{resolve_reference_fields, FieldMeta, InMemoryLabelSource};
use crate::record::{Record, Searchable};
use crate::table::{
    HeaderCell, RowRenderer, SearchableTable, Selection, SelectionCell, TableError, TableOptions, TableView,
    TextTable,
};

use super::extract::ApiJson;
use super::response::{ApiResponse, ApiResult};

fn default_true() -> bool {
    true
}

/// Table input shared by the view and selection endpoints and by `tablectl`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRequest {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub search_keys: Vec<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_true")]
    pub show_search: bool,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub enable_selection: bool,
    #[serde(default)]
    pub selected: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_search_results_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<FieldMeta>,
    /// Referenced tables for label resolution, keyed by table name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub lookups: HashMap<String, Vec<Record>>,
}

/// Data after filters and label resolution, with the table configured for it
pub struct PreparedTable {
    pub data: Vec<Record>,
    pub table: SearchableTable<Record>,
    pub columns: Vec<String>,
    pub selected: Selection,
}

impl TableRequest {
    pub fn options(&self, config: &AppConfig) -> TableOptions {
        TableOptions {
            title: self.title.clone(),
            search_keys: self.search_keys.clone(),
            search_placeholder: self
                .search_placeholder
                .clone()
                .unwrap_or_else(|| config.table.search_placeholder.clone()),
            show_search: self.show_search,
            loading: self.loading,
            enable_selection: self.enable_selection,
            empty_message: self.empty_message.clone().unwrap_or_else(|| config.table.empty_message.clone()),
            no_search_results_message: self
                .no_search_results_message
                .clone()
                .unwrap_or_else(|| config.table.no_search_results_message.clone()),
        }
    }

    /// Apply limits, filters and reference labels, in that order.
    ///
    /// Filters run on stored values; labels only replace what is displayed and
    /// searched.
    pub async fn prepare(self, config: &AppConfig) -> Result<PreparedTable, ApiError> {
        if self.data.len() > config.table.max_rows {
            return Err(TableError::TooManyRows {
                count: self.data.len(),
                max: config.table.max_rows,
            }
            .into());
        }
        check_limits(&self.filters, &config.filter)?;

        let sink: SharedSink = if config.table.debug_diagnostics {
            Arc::new(TracingSink)
        } else {
            diagnostics::noop()
        };

        let options = self.options(config);
        let filters = sort_by_order(self.filters);
        let mut data: Vec<Record> = self
            .data
            .into_iter()
            .filter(|r| matches_filters(&filters, r))
            .collect();

        if let Some(tenant_id) = self.tenant_id.as_deref() {
            if !self.references.is_empty() {
                let mut source = InMemoryLabelSource::new();
                for (name, rows) in self.lookups {
                    source.insert_table(name, rows);
                }
                data = resolve_reference_fields(tenant_id, &data, &self.references, &source, sink.as_ref()).await;
            }
        }

        let columns = match self.columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => TextTable::infer(&data).columns().to_vec(),
        };

        let mut table = SearchableTable::new(options).with_diagnostics(sink);
        if let Some(id_field) = self.id_field.as_deref().filter(|f| !f.is_empty()) {
            table = table.with_shared_id_extractor(Record::id_extractor(id_field));
        }
        table.set_search_query(self.query);

        Ok(PreparedTable {
            data,
            table,
            columns,
            selected: self.selected,
        })
    }
}

/// Renders rows as JSON objects keyed by column
pub struct JsonRows {
    columns: Vec<String>,
    id_field: Option<String>,
}

impl JsonRows {
    pub fn new(columns: Vec<String>, id_field: Option<String>) -> Self {
        Self { columns, id_field }
    }
}

impl RowRenderer<Record> for JsonRows {
    type Output = Value;

    fn render_row(&self, item: &Record, index: usize, cell: SelectionCell) -> Value {
        let cells: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| {
                let text = item.search_text(c).map(|t| Value::String(t.into_owned())).unwrap_or(Value::Null);
                (c.clone(), text)
            })
            .collect();
        serde_json::json!({
            "index": index,
            "id": self.id_field.as_deref().map(|f| item.identity(f)),
            "selected": cell.is_checked(),
            "selection": cell,
            "cells": cells,
        })
    }

    fn render_header(&self, cell: HeaderCell) -> Option<Value> {
        Some(serde_json::json!({
            "columns": self.columns,
            "select_all": cell,
        }))
    }
}

#[derive(Debug, Serialize)]
pub struct SearchBoxView {
    pub placeholder: String,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionSummary {
    pub enabled: bool,
    pub all_selected: bool,
    pub indeterminate: bool,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TableViewResponse {
    pub state: &'static str,
    pub title: Option<String>,
    pub message: Option<String>,
    pub search: Option<SearchBoxView>,
    pub header: Option<Value>,
    pub rows: Vec<Value>,
    pub total: usize,
    pub visible: usize,
    pub selection: SelectionSummary,
}

impl PreparedTable {
    pub fn view(&self, id_field: Option<String>) -> TableViewResponse {
        let renderer = JsonRows::new(self.columns.clone(), id_field);
        let view = self.table.render(&self.data, &self.selected, &renderer);
        let state = self.table.selection_state(&self.data, &self.selected);

        let (header, rows) = match &view {
            TableView::Table { header, rows } => (header.clone(), rows.clone()),
            _ => (None, vec![]),
        };

        TableViewResponse {
            state: view.state(),
            title: self.table.options().title.clone(),
            message: view.message().map(str::to_string),
            search: self.table.search_box().map(|b| SearchBoxView {
                placeholder: b.placeholder.to_string(),
                query: b.query.to_string(),
            }),
            header,
            visible: rows.len(),
            rows,
            total: self.data.len(),
            selection: SelectionSummary {
                enabled: self.table.options().enable_selection,
                all_selected: state.all_selected,
                indeterminate: state.indeterminate,
                count: self.selected.len(),
            },
        }
    }

    /// Lay the table out as text, for terminals
    pub fn text(&self) -> String {
        let renderer = TextTable::new(self.columns.clone());
        let view = self.table.render(&self.data, &self.selected, &renderer);
        crate::table::text::format_view(
            self.table.options().title.as_deref(),
            self.table.search_box().as_ref(),
            &view,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionAction {
    SelectAll { checked: bool },
    Toggle { id: String, checked: bool },
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(flatten)]
    pub table: TableRequest,
    pub action: SelectionAction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub changed: bool,
    pub selected: Selection,
}

/// POST /api/table/view
pub async fn view(State(config): State<Arc<AppConfig>>, ApiJson(request): ApiJson<TableRequest>) -> ApiResult<TableViewResponse> {
    let id_field = request.id_field.clone();
    let prepared = request.prepare(&config).await?;
    let response = prepared.view(id_field);
    tracing::debug!("Rendered table: {} ({} of {} rows)", response.state, response.visible, response.total);
    Ok(ApiResponse::success(response))
}

/// POST /api/table/selection
pub async fn selection(
    State(config): State<Arc<AppConfig>>,
    ApiJson(request): ApiJson<SelectionRequest>,
) -> ApiResult<SelectionResponse> {
    let table = request.table;
    if table.enable_selection && table.id_field.as_deref().map_or(true, str::is_empty) {
        return Err(TableError::MissingIdField.into());
    }

    let prepared = table.prepare(&config).await?;
    let next = match &request.action {
        SelectionAction::SelectAll { checked } => prepared.table.select_all(&prepared.data, *checked),
        SelectionAction::Toggle { id, checked } => prepared.table.toggle(&prepared.selected, id, *checked),
    };

    let response = match next {
        Some(selected) => SelectionResponse { changed: selected != prepared.selected, selected },
        None => SelectionResponse { changed: false, selected: prepared.selected },
    };
    Ok(ApiResponse::success(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> TableRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn filters_run_before_search() {
        let config = AppConfig::for_environment(crate::config::Environment::Development);
        let req = request(json!({
            "data": [
                {"id": "1", "name": "Acme", "status": "open"},
                {"id": "2", "name": "Acme West", "status": "closed"},
                {"id": "3", "name": "Globex", "status": "open"}
            ],
            "search_keys": ["name"],
            "query": "acme",
            "filters": [{"conditions": [{"field_name": "status", "operator": "==", "value": "open"}]}]
        }));
        let prepared = req.prepare(&config).await.unwrap();
        assert_eq!(prepared.data.len(), 2);

        let view = prepared.view(None);
        assert_eq!(view.state, "table");
        assert_eq!(view.visible, 1);
        assert_eq!(view.rows[0]["cells"]["name"], "Acme");
    }

    #[tokio::test]
    async fn untyped_numeric_filters_keep_larger_values() {
        let config = AppConfig::for_environment(crate::config::Environment::Development);
        let req = request(json!({
            "data": [{"id": 1, "amount": 10}, {"id": 2, "amount": 5}, {"id": 3, "amount": 100}],
            "id_field": "id",
            "filters": [{"conditions": [{"field_name": "amount", "operator": ">", "value": 9}]}]
        }));
        let prepared = req.prepare(&config).await.unwrap();
        let ids: Vec<String> = prepared.data.iter().map(|r| r.identity("id")).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn enforces_row_cap() {
        let mut config = AppConfig::for_environment(crate::config::Environment::Development);
        config.table.max_rows = 1;
        let req = request(json!({"data": [{"id": "1"}, {"id": "2"}]}));
        let err = req.prepare(&config).await.err().unwrap();
        assert_eq!(err.status_code(), 413);
    }

    #[tokio::test]
    async fn text_view_uses_config_messages() {
        let mut config = AppConfig::for_environment(crate::config::Environment::Development);
        config.table.empty_message = "Nothing here".into();
        let prepared = request(json!({"title": "Deals"})).prepare(&config).await.unwrap();
        assert_eq!(prepared.text(), "Deals\nNothing here");
    }
}
