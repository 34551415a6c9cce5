//! Render-ready snapshot of a select control.

use super::control::SelectPhase;
use super::option::SelectOption;
use super::provider::SearchError;

/// A committed id with its label, if one is known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem<Id> {
    pub id: Id,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectView<Id> {
    pub label: String,
    pub placeholder: String,
    pub phase: SelectPhase,
    pub query: String,
    /// What the text input shows: the query while editing, otherwise the
    /// committed label of a single select.
    pub input_text: String,
    /// Options in the dropdown; empty while closed.
    pub options: Vec<SelectOption<Id>>,
    pub active_index: Option<usize>,
    /// Committed ids in order (the tags of a multi select).
    pub selected: Vec<SelectedItem<Id>>,
    /// Loading / empty / error text shown in place of options.
    pub message: Option<String>,
    /// Last selected-options resolver failure.
    pub selection_error: Option<SearchError>,
    pub disabled: bool,
}

impl<Id> SelectView<Id> {
    pub fn is_open(&self) -> bool {
        self.phase != SelectPhase::Closed
    }

    pub fn active_option(&self) -> Option<&SelectOption<Id>> {
        self.options.get(self.active_index?)
    }
}

pub fn no_results_message(query: &str) -> String {
    format!("No results found for \"{query}\"")
}

pub(crate) fn status_message(phase: &SelectPhase, query: &str) -> Option<String> {
    match phase {
        SelectPhase::Closed | SelectPhase::WithResults => None,
        SelectPhase::Loading => Some("Loading...".to_owned()),
        SelectPhase::Empty if query.is_empty() => Some("No options available".to_owned()),
        SelectPhase::Empty => Some(no_results_message(query)),
        SelectPhase::Error(e) => Some(format!("Failed to load options: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_per_phase() {
        assert_eq!(status_message(&SelectPhase::Closed, "x"), None);
        assert_eq!(status_message(&SelectPhase::Loading, "x").as_deref(), Some("Loading..."));
        assert_eq!(
            status_message(&SelectPhase::Empty, "nonexistent").as_deref(),
            Some("No results found for \"nonexistent\"")
        );
        assert_eq!(
            status_message(&SelectPhase::Empty, "").as_deref(),
            Some("No options available")
        );
        assert_eq!(
            status_message(&SelectPhase::Error(SearchError::Status(500)), "").as_deref(),
            Some("Failed to load options: server responded with status 500")
        );
    }
}
