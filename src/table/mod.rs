pub mod render;
pub mod search;
pub mod selection;
pub mod text;

use std::sync::Arc;

use crate::diagnostics::{Diagnostic, NoopSink, SharedSink};
use crate::record::Searchable;

pub use render::{HeaderCell, RowRenderer, SearchBox, SelectionCell, TableView};
pub use search::{filter_items, matches_query};
pub use selection::{Selection, SelectionState};
pub use text::TextTable;

pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search...";
pub const DEFAULT_EMPTY_MESSAGE: &str = "No items found.";
pub const DEFAULT_NO_SEARCH_RESULTS_MESSAGE: &str = "No items found matching your search.";

/// Errors raised when a table request cannot be served
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Too many rows: {count} (max {max})")]
    TooManyRows { count: usize, max: usize },

    #[error("Selection requires an id field")]
    MissingIdField,
}

/// Maps an item to its stable identifier
pub type IdExtractor<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Receives every replacement selection the table computes
pub type SelectionCallback = Arc<dyn Fn(&Selection) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub title: Option<String>,
    pub search_keys: Vec<String>,
    pub search_placeholder: String,
    pub show_search: bool,
    pub loading: bool,
    pub enable_selection: bool,
    pub empty_message: String,
    pub no_search_results_message: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            title: None,
            search_keys: vec![],
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_string(),
            show_search: true,
            loading: false,
            enable_selection: false,
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            no_search_results_message: DEFAULT_NO_SEARCH_RESULTS_MESSAGE.to_string(),
        }
    }
}

/// A filterable, optionally selectable table over items of any shape.
///
/// The table keeps exactly one piece of state, the search query. Data and the
/// current selection are passed in on every call, so new data never resets
/// the query and the caller stays the owner of the selection.
pub struct SearchableTable<T> {
    options: TableOptions,
    id_extractor: Option<IdExtractor<T>>,
    on_selection_change: Option<SelectionCallback>,
    diagnostics: SharedSink,
    search_query: String,
}

impl<T> std::fmt::Debug for SearchableTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchableTable")
            .field("options", &self.options)
            .field("has_id_extractor", &self.id_extractor.is_some())
            .field("has_selection_callback", &self.on_selection_change.is_some())
            .field("search_query", &self.search_query)
            .finish()
    }
}

impl<T> SearchableTable<T> {
    pub fn new(options: TableOptions) -> Self {
        Self {
            options,
            id_extractor: None,
            on_selection_change: None,
            diagnostics: Arc::new(NoopSink),
            search_query: String::new(),
        }
    }

    pub fn with_id_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.id_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_shared_id_extractor(mut self, extractor: IdExtractor<T>) -> Self {
        self.id_extractor = Some(extractor);
        self
    }

    pub fn on_selection_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Selection) + Send + Sync + 'static,
    {
        self.on_selection_change = Some(Arc::new(callback));
        self
    }

    pub fn with_diagnostics(mut self, sink: SharedSink) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.options.loading = loading;
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// The search box is shown only when enabled and there is something to search
    pub fn search_enabled(&self) -> bool {
        self.options.show_search && !self.options.search_keys.is_empty()
    }

    pub fn search_box(&self) -> Option<SearchBox<'_>> {
        self.search_enabled().then(|| SearchBox {
            placeholder: &self.options.search_placeholder,
            query: &self.search_query,
        })
    }

    /// Query in effect for filtering. A query cannot be typed without a search
    /// box, so it only applies while the box is shown.
    fn effective_query(&self) -> &str {
        if self.search_enabled() {
            &self.search_query
        } else {
            ""
        }
    }

    /// Is a non-empty query narrowing the data?
    pub fn search_active(&self) -> bool {
        !self.effective_query().is_empty()
    }

    fn selection_usable(&self) -> Option<&IdExtractor<T>> {
        if !self.options.enable_selection {
            self.diagnostics.emit(&Diagnostic::SelectionIgnored { reason: "selection disabled" });
            return None;
        }
        match &self.id_extractor {
            Some(extractor) => Some(extractor),
            None => {
                self.diagnostics.emit(&Diagnostic::SelectionIgnored { reason: "no id extractor" });
                None
            }
        }
    }

    fn report(&self, next: Selection) -> Selection {
        self.diagnostics.emit(&Diagnostic::SelectionChanged { selected: next.len() });
        if let Some(callback) = &self.on_selection_change {
            callback(&next);
        }
        next
    }

    /// Flip one identifier. `None` when selection is unavailable.
    pub fn toggle(&self, selected: &Selection, id: &str, checked: bool) -> Option<Selection> {
        self.selection_usable()?;
        Some(self.report(selection::toggle(selected, id, checked)))
    }

    pub fn toggle_item(&self, item: &T, selected: &Selection, checked: bool) -> Option<Selection> {
        let extractor = self.selection_usable()?;
        let id = extractor(item);
        Some(self.report(selection::toggle(selected, &id, checked)))
    }
}

impl<T: Searchable> SearchableTable<T> {
    /// Items that pass the current search, in data order
    pub fn visible<'a>(&self, data: &'a [T]) -> Vec<&'a T> {
        let query = self.effective_query();
        let visible = filter_items(data, &self.options.search_keys, query);
        if !query.is_empty() {
            self.diagnostics.emit(&Diagnostic::SearchApplied {
                query: query.to_string(),
                total: data.len(),
                visible: visible.len(),
            });
        }
        visible
    }

    /// Identifiers of the visible items; `None` without an id extractor
    pub fn visible_ids(&self, data: &[T]) -> Option<Vec<String>> {
        let extractor = self.id_extractor.as_ref()?;
        Some(self.visible(data).into_iter().map(|item| extractor(item)).collect())
    }

    pub fn selection_state(&self, data: &[T], selected: &Selection) -> SelectionState {
        let visible = self.visible(data);
        self.state_for(&visible, selected)
    }

    fn state_for(&self, visible: &[&T], selected: &Selection) -> SelectionState {
        if !self.options.enable_selection {
            return SelectionState::default();
        }
        match &self.id_extractor {
            Some(extractor) => {
                let ids: Vec<String> = visible.iter().map(|item| extractor(*item)).collect();
                SelectionState::compute(ids.iter().map(String::as_str), selected)
            }
            // Nothing can be matched against the selection, so nothing counts as all selected
            None => SelectionState { all_selected: false, indeterminate: !selected.is_empty() },
        }
    }

    /// Header checkbox: select exactly the visible items, or clear everything.
    /// `None` when selection is unavailable.
    pub fn select_all(&self, data: &[T], checked: bool) -> Option<Selection> {
        let extractor = self.selection_usable()?;
        let visible = self.visible(data);
        let next = selection::select_all(visible.into_iter().map(|item| extractor(item)), checked);
        Some(self.report(next))
    }

    /// Render the current state. Loading wins over everything, then an empty
    /// result, then the table itself.
    pub fn render<R>(&self, data: &[T], selected: &Selection, renderer: &R) -> TableView<R::Output>
    where
        R: RowRenderer<T>,
    {
        let view = self.build_view(data, selected, renderer);
        self.diagnostics.emit(&Diagnostic::RenderState { state: view.state() });
        view
    }

    fn build_view<R>(&self, data: &[T], selected: &Selection, renderer: &R) -> TableView<R::Output>
    where
        R: RowRenderer<T>,
    {
        if self.options.loading {
            return TableView::Loading;
        }

        let visible = self.visible(data);
        if visible.is_empty() {
            let message = if self.search_active() {
                &self.options.no_search_results_message
            } else {
                &self.options.empty_message
            };
            return TableView::Empty { message: message.clone() };
        }

        let header_cell = if self.options.enable_selection {
            let state = self.state_for(&visible, selected);
            HeaderCell::Checkbox { checked: state.all_selected, indeterminate: state.indeterminate }
        } else {
            HeaderCell::Disabled
        };
        let header = renderer.render_header(header_cell);

        let rows = visible
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let cell = if self.options.enable_selection {
                    let checked = self
                        .id_extractor
                        .as_ref()
                        .map(|extractor| selected.contains(&extractor(*item)))
                        .unwrap_or(false);
                    SelectionCell::Checkbox { checked }
                } else {
                    SelectionCell::Disabled
                };
                renderer.render_row(*item, index, cell)
            })
            .collect();

        TableView::Table { header, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::record::Record;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn people() -> Vec<Value> {
        vec![json!({"id": "1", "name": "Alice"}), json!({"id": "2", "name": "Bob"})]
    }

    fn by_name() -> TableOptions {
        TableOptions { search_keys: vec!["name".to_string()], ..TableOptions::default() }
    }

    fn id_of(item: &Value) -> String {
        item["id"].as_str().unwrap_or_default().to_string()
    }

    fn selectable() -> SearchableTable<Value> {
        SearchableTable::new(TableOptions { enable_selection: true, ..by_name() }).with_id_extractor(id_of)
    }

    fn sel(ids: &[&str]) -> Selection {
        ids.iter().copied().collect()
    }

    /// Renders a row as the item id plus a checkbox marker
    fn marker(item: &Value, _index: usize, cell: SelectionCell) -> String {
        match cell {
            SelectionCell::Disabled => id_of(item),
            SelectionCell::Checkbox { checked } => format!("{}:{}", id_of(item), checked),
        }
    }

    #[test]
    fn search_narrows_visible_items() {
        let data = people();
        let mut table = SearchableTable::new(by_name());
        table.set_search_query("ali");
        assert_eq!(table.visible(&data), vec![&data[0]]);

        table.set_search_query("z");
        assert!(table.visible(&data).is_empty());
        assert_eq!(
            table.render(&data, &Selection::new(), &marker),
            TableView::Empty { message: DEFAULT_NO_SEARCH_RESULTS_MESSAGE.to_string() }
        );
    }

    #[test]
    fn empty_data_shows_empty_message() {
        let table: SearchableTable<Value> = SearchableTable::new(by_name());
        assert_eq!(
            table.render(&[], &Selection::new(), &marker),
            TableView::Empty { message: DEFAULT_EMPTY_MESSAGE.to_string() }
        );
    }

    #[test]
    fn nested_fields_are_searched_case_insensitively() {
        let data = vec![json!({"fields": {"status": "open"}}), json!({"fields": {"status": "done"}})];
        let mut table = SearchableTable::new(TableOptions {
            search_keys: vec!["status".to_string()],
            ..TableOptions::default()
        });
        table.set_search_query("OPEN");
        assert_eq!(table.visible(&data), vec![&data[0]]);
    }

    #[test]
    fn loading_wins_over_everything() {
        let data = people();
        let mut table = SearchableTable::new(TableOptions { loading: true, ..by_name() });
        table.set_search_query("nothing matches this");
        assert_eq!(table.render(&data, &Selection::new(), &marker), TableView::Loading);
        table.set_loading(false);
        assert_eq!(table.render(&data, &Selection::new(), &marker).state(), "empty");
    }

    #[test]
    fn query_survives_new_data() {
        let mut table = SearchableTable::new(by_name());
        table.set_search_query("bob");
        let first = people();
        assert_eq!(table.visible(&first).len(), 1);
        let second = vec![json!({"id": "9", "name": "Bobby"}), json!({"id": "8", "name": "Eve"})];
        assert_eq!(table.search_query(), "bob");
        assert_eq!(table.visible(&second), vec![&second[0]]);
    }

    #[test]
    fn search_box_needs_keys() {
        let mut table: SearchableTable<Value> = SearchableTable::new(TableOptions::default());
        assert!(table.search_box().is_none());
        // a stored query without a search box does not filter
        table.set_search_query("zzz");
        assert_eq!(table.visible(&people()).len(), 2);

        let table: SearchableTable<Value> = SearchableTable::new(by_name());
        let search_box = table.search_box().unwrap();
        assert_eq!(search_box.placeholder, DEFAULT_SEARCH_PLACEHOLDER);
        assert_eq!(search_box.query, "");

        let hidden: SearchableTable<Value> =
            SearchableTable::new(TableOptions { show_search: false, ..by_name() });
        assert!(hidden.search_box().is_none());
    }

    #[test]
    fn select_all_uses_only_visible_items() {
        let data = vec![
            json!({"id": "A", "name": "Anna"}),
            json!({"id": "B", "name": "Annabel"}),
            json!({"id": "C", "name": "Carl"}),
        ];
        let mut table = selectable();
        table.set_search_query("ann");
        let prior = sel(&["C"]);
        assert!(!table.selection_state(&data, &prior).all_selected);

        let next = table.select_all(&data, true).unwrap();
        assert_eq!(next, sel(&["A", "B"]));
        assert!(table.select_all(&data, false).unwrap().is_empty());
    }

    #[test]
    fn toggle_changes_a_single_id() {
        let table = selectable();
        let current = sel(&["1", "7"]);
        assert_eq!(table.toggle(&current, "2", true).unwrap(), sel(&["1", "2", "7"]));
        assert_eq!(table.toggle(&current, "7", false).unwrap(), sel(&["1"]));

        let data = people();
        assert_eq!(table.toggle_item(&data[1], &current, true).unwrap(), sel(&["1", "2", "7"]));
    }

    #[test]
    fn selection_flags_follow_visible_set() {
        let data = people();
        let table = selectable();

        let state = table.selection_state(&data, &sel(&["1", "2"]));
        assert!(state.all_selected && !state.indeterminate);

        let state = table.selection_state(&data, &sel(&["1"]));
        assert!(!state.all_selected && state.indeterminate);

        let state = table.selection_state(&data, &Selection::new());
        assert_eq!(state, SelectionState::default());

        let state = table.selection_state(&[], &sel(&["1"]));
        assert!(!state.all_selected && state.indeterminate);
    }

    #[test]
    fn selection_without_extractor_is_a_silent_no_op() {
        let sink = Arc::new(MemorySink::new());
        let table: SearchableTable<Value> =
            SearchableTable::new(TableOptions { enable_selection: true, ..by_name() })
                .with_diagnostics(sink.clone());
        let data = people();
        assert_eq!(table.select_all(&data, true), None);
        assert_eq!(table.toggle(&Selection::new(), "1", true), None);
        assert!(sink
            .events()
            .contains(&Diagnostic::SelectionIgnored { reason: "no id extractor" }));

        // checkboxes still render, never checked
        let view = table.render(&data, &sel(&["1"]), &marker);
        assert_eq!(view.rows(), &["1:false".to_string(), "2:false".to_string()]);
    }

    #[test]
    fn selection_disabled_ignores_actions() {
        let table: SearchableTable<Value> = SearchableTable::new(by_name()).with_id_extractor(id_of);
        assert_eq!(table.select_all(&people(), true), None);
        assert_eq!(table.selection_state(&people(), &sel(&["1"])), SelectionState::default());
    }

    #[test]
    fn callback_receives_replacement_selection() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let table = selectable().on_selection_change(move |next| {
            sink.lock().unwrap().push(next.to_vec());
        });
        table.select_all(&people(), true);
        table.toggle(&sel(&["1", "2"]), "1", false);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec!["1".to_string(), "2".to_string()], vec!["2".to_string()]]
        );
    }

    struct Labeled;

    impl RowRenderer<Value> for Labeled {
        type Output = String;

        fn render_row(&self, item: &Value, index: usize, cell: SelectionCell) -> String {
            let mark = if cell.is_checked() { "x" } else { " " };
            format!("{} [{}] {}", index, mark, item["name"].as_str().unwrap_or(""))
        }

        fn render_header(&self, cell: HeaderCell) -> Option<String> {
            Some(match cell {
                HeaderCell::Disabled => "name".to_string(),
                HeaderCell::Checkbox { checked, indeterminate } => {
                    format!("all={} partial={} name", checked, indeterminate)
                }
            })
        }
    }

    #[test]
    fn rows_get_selection_slot_and_visible_index() {
        let data = people();
        let mut table = selectable();
        table.set_search_query("bob");
        let view = table.render(&data, &sel(&["2"]), &Labeled);
        assert_eq!(
            view,
            TableView::Table {
                header: Some("all=true partial=false name".to_string()),
                rows: vec!["0 [x] Bob".to_string()],
            }
        );
    }

    #[test]
    fn header_without_selection_has_no_checkbox() {
        let table = SearchableTable::new(by_name());
        let view = table.render(&people(), &Selection::new(), &Labeled);
        match view {
            TableView::Table { header, rows } => {
                assert_eq!(header.as_deref(), Some("name"));
                assert_eq!(rows.len(), 2);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn diagnostics_report_search_and_state() {
        let sink = Arc::new(MemorySink::new());
        let mut table = SearchableTable::new(by_name()).with_diagnostics(sink.clone());
        table.set_search_query("ali");
        table.render(&people(), &Selection::new(), &marker);
        let events = sink.events();
        assert!(events.contains(&Diagnostic::SearchApplied { query: "ali".into(), total: 2, visible: 1 }));
        assert_eq!(events.last(), Some(&Diagnostic::RenderState { state: "table" }));
    }

    #[test]
    fn works_over_records() {
        let data = vec![
            Record::from_json(json!({"record_id": "r1", "fields": {"name": "Acme"}})).unwrap(),
            Record::from_json(json!({"record_id": "r2", "fields": {"name": "Globex"}})).unwrap(),
        ];
        let mut table = SearchableTable::new(TableOptions { enable_selection: true, ..by_name() })
            .with_shared_id_extractor(Record::id_extractor("record_id"));
        table.set_search_query("glob");
        assert_eq!(table.visible_ids(&data), Some(vec!["r2".to_string()]));
    }
}
