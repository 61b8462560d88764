use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of selected item identifiers.
///
/// Owned by the caller and handed to the table on every call; the table only
/// ever reports a replacement set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { ids: iter.into_iter().map(Into::into).collect() }
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Header checkbox state derived from the visible items and the selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub all_selected: bool,
    pub indeterminate: bool,
}

impl SelectionState {
    /// All selected needs at least one visible item; indeterminate is "something
    /// selected but not everything visible".
    pub fn compute<'a, I>(visible_ids: I, selected: &Selection) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any_visible = false;
        let mut all_in = true;
        for id in visible_ids {
            any_visible = true;
            if !selected.contains(id) {
                all_in = false;
                break;
            }
        }
        let all_selected = any_visible && all_in;
        Self {
            all_selected,
            indeterminate: !selected.is_empty() && !all_selected,
        }
    }
}

/// Replacement selection for the header checkbox: the visible ids when
/// checked, nothing otherwise. Previously selected ids that are not visible
/// are dropped.
pub fn select_all<I, S>(visible_ids: I, checked: bool) -> Selection
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if checked {
        visible_ids.into_iter().collect()
    } else {
        Selection::new()
    }
}

/// Replacement selection after flipping one row checkbox
pub fn toggle(selected: &Selection, id: &str, checked: bool) -> Selection {
    let mut next = selected.clone();
    if checked {
        next.insert(id);
    } else {
        next.remove(id);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(ids: &[&str]) -> Selection {
        ids.iter().copied().collect()
    }

    #[test]
    fn select_all_replaces_hidden_selection() {
        let next = select_all(["A", "B"], true);
        assert_eq!(next, sel(&["A", "B"]));
        assert!(!next.contains("C"));
    }

    #[test]
    fn unchecking_select_all_clears() {
        assert!(select_all(["A", "B"], false).is_empty());
    }

    #[test]
    fn toggle_touches_only_one_id() {
        let current = sel(&["A", "C"]);
        assert_eq!(toggle(&current, "B", true), sel(&["A", "B", "C"]));
        assert_eq!(toggle(&current, "A", false), sel(&["C"]));
        // re-adding is idempotent
        assert_eq!(toggle(&current, "A", true), current);
    }

    #[test]
    fn all_selected_requires_visible_items() {
        let state = SelectionState::compute(std::iter::empty(), &sel(&["A"]));
        assert!(!state.all_selected);
        assert!(state.indeterminate);

        let state = SelectionState::compute(std::iter::empty(), &Selection::new());
        assert_eq!(state, SelectionState::default());
    }

    #[test]
    fn all_selected_is_subset_check() {
        let state = SelectionState::compute(["A", "B"], &sel(&["A", "B", "Z"]));
        assert!(state.all_selected);
        assert!(!state.indeterminate);

        let state = SelectionState::compute(["A", "B"], &sel(&["A"]));
        assert!(!state.all_selected);
        assert!(state.indeterminate);
    }

    #[test]
    fn duplicates_collapse_on_deserialize() {
        let selection: Selection = serde_json::from_str(r#"["1","1","2"]"#).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(serde_json::to_string(&selection).unwrap(), r#"["1","2"]"#);
    }
}
