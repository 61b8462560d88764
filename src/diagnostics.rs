//! Diagnostic events emitted by tables and label resolution.
//!
//! Sinks are injected; the default [`NoopSink`] drops everything so rendering
//! behaves the same whether or not anyone listens.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Level;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    SearchApplied { query: String, total: usize, visible: usize },
    SelectionIgnored { reason: &'static str },
    SelectionChanged { selected: usize },
    RenderState { state: &'static str },
    ReferenceUnresolved { field: String, value: String },
    LabelLookupFailed { table: String, error: String },
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::SearchApplied { .. } | Diagnostic::RenderState { .. } => Level::TRACE,
            Diagnostic::SelectionIgnored { .. }
            | Diagnostic::SelectionChanged { .. }
            | Diagnostic::ReferenceUnresolved { .. } => Level::DEBUG,
            Diagnostic::LabelLookupFailed { .. } => Level::WARN,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SearchApplied { query, total, visible } => {
                write!(f, "search '{}' matched {} of {} items", query, visible, total)
            }
            Diagnostic::SelectionIgnored { reason } => write!(f, "selection ignored: {}", reason),
            Diagnostic::SelectionChanged { selected } => {
                write!(f, "selection changed: {} selected", selected)
            }
            Diagnostic::RenderState { state } => write!(f, "render state: {}", state),
            Diagnostic::ReferenceUnresolved { field, value } => {
                write!(f, "no label for {} = {}", field, value)
            }
            Diagnostic::LabelLookupFailed { table, error } => {
                write!(f, "label lookup on {} failed: {}", table, error)
            }
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

pub type SharedSink = Arc<dyn DiagnosticSink>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Forwards diagnostics to `tracing` at the event's own level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic.level() {
            Level::TRACE => tracing::trace!(target: "searchable_table", "{}", diagnostic),
            Level::DEBUG => tracing::debug!(target: "searchable_table", "{}", diagnostic),
            Level::INFO => tracing::info!(target: "searchable_table", "{}", diagnostic),
            Level::WARN => tracing::warn!(target: "searchable_table", "{}", diagnostic),
            Level::ERROR => tracing::error!(target: "searchable_table", "{}", diagnostic),
        }
    }
}

/// Keeps every emitted diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: &Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic.clone());
        }
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn emit(&self, diagnostic: &Diagnostic) {
        (**self).emit(diagnostic)
    }
}

pub fn noop() -> SharedSink {
    Arc::new(NoopSink)
}
