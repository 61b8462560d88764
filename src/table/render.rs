use serde::Serialize;

/// Selection slot handed to every row.
///
/// Rows always receive a slot; when selection is off it is `Disabled` and the
/// renderer simply leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionCell {
    Disabled,
    Checkbox { checked: bool },
}

impl SelectionCell {
    pub fn is_enabled(&self) -> bool {
        matches!(self, SelectionCell::Checkbox { .. })
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, SelectionCell::Checkbox { checked: true })
    }
}

/// Select-all slot handed to the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeaderCell {
    Disabled,
    Checkbox { checked: bool, indeterminate: bool },
}

impl HeaderCell {
    pub fn is_enabled(&self) -> bool {
        matches!(self, HeaderCell::Checkbox { .. })
    }
}

/// Draws rows (and optionally a header) for items of type `T`.
///
/// `index` is the position of the item in the visible (filtered) list.
pub trait RowRenderer<T> {
    type Output;

    fn render_row(&self, item: &T, index: usize, cell: SelectionCell) -> Self::Output;

    /// Tables without a header return `None`
    fn render_header(&self, _cell: HeaderCell) -> Option<Self::Output> {
        None
    }
}

/// Closures work as header-less renderers
impl<T, O, F> RowRenderer<T> for F
where
    F: Fn(&T, usize, SelectionCell) -> O,
{
    type Output = O;

    fn render_row(&self, item: &T, index: usize, cell: SelectionCell) -> O {
        self(item, index, cell)
    }
}

/// Result of one render. Exactly one of these is produced per call.
#[derive(Debug, Clone, PartialEq)]
pub enum TableView<R> {
    Loading,
    Empty { message: String },
    Table { header: Option<R>, rows: Vec<R> },
}

impl<R> TableView<R> {
    pub fn state(&self) -> &'static str {
        match self {
            TableView::Loading => "loading",
            TableView::Empty { .. } => "empty",
            TableView::Table { .. } => "table",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            TableView::Empty { message } => Some(message),
            _ => None,
        }
    }

    pub fn rows(&self) -> &[R] {
        match self {
            TableView::Table { rows, .. } => rows,
            _ => &[],
        }
    }
}

/// Search input model, present only when the search box is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchBox<'a> {
    pub placeholder: &'a str,
    pub query: &'a str,
}
