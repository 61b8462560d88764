use crate::record::{Record, Searchable};

use super::render::{HeaderCell, RowRenderer, SearchBox, SelectionCell, TableView};

const SEPARATOR: &str = " | ";

/// Plain-text renderer over a fixed list of columns
#[derive(Debug, Clone)]
pub struct TextTable {
    columns: Vec<String>,
}

impl TextTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Columns are taken from the first record that has any: the nested
    /// mapping when present, the top-level properties otherwise.
    pub fn infer(records: &[Record]) -> Self {
        let columns = records
            .iter()
            .find(|r| !r.is_empty())
            .map(|r| match r.fields() {
                Some(nested) => nested.keys().cloned().collect(),
                None => r.to_map().keys().cloned().collect(),
            })
            .unwrap_or_default();
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn line(&self, lead: Option<&str>, cells: Vec<String>) -> String {
        lead.map(str::to_string)
            .into_iter()
            .chain(cells)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

impl RowRenderer<Record> for TextTable {
    type Output = String;

    fn render_row(&self, item: &Record, _index: usize, cell: SelectionCell) -> String {
        let lead = match cell {
            SelectionCell::Disabled => None,
            SelectionCell::Checkbox { checked: true } => Some("[x]"),
            SelectionCell::Checkbox { checked: false } => Some("[ ]"),
        };
        let cells = self
            .columns
            .iter()
            .map(|c| item.search_text(c).map(|t| t.into_owned()).unwrap_or_default())
            .collect();
        self.line(lead, cells)
    }

    fn render_header(&self, cell: HeaderCell) -> Option<String> {
        let lead = match cell {
            HeaderCell::Disabled => None,
            HeaderCell::Checkbox { checked: true, .. } => Some("[x]"),
            HeaderCell::Checkbox { indeterminate: true, .. } => Some("[-]"),
            HeaderCell::Checkbox { .. } => Some("[ ]"),
        };
        Some(self.line(lead, self.columns.clone()))
    }
}

/// Lay out a rendered view, with optional title and search line, as printable text
pub fn format_view(title: Option<&str>, search: Option<&SearchBox<'_>>, view: &TableView<String>) -> String {
    let mut out = Vec::new();
    if let Some(title) = title {
        out.push(title.to_string());
    }
    if let Some(search) = search {
        if search.query.is_empty() {
            out.push(format!("🔍 {}", search.placeholder));
        } else {
            out.push(format!("🔍 {}", search.query));
        }
    }
    match view {
        TableView::Loading => out.push("Loading...".to_string()),
        TableView::Empty { message } => out.push(message.clone()),
        TableView::Table { header, rows } => {
            if let Some(header) = header {
                out.push(header.clone());
                out.push("-".repeat(header.chars().count()));
            }
            out.extend(rows.iter().cloned());
        }
    }
    out.join("\n")
}
