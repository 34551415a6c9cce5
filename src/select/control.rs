//! Typeahead select control as a synchronous state machine.
//!
//! The control reacts to UI events and to search completions. It never
//! performs I/O: searches it wants issued come back in [`Update::search`],
//! and value changes it proposes come back in [`Update::change`]. The
//! committed value is owned by the caller and passed into every handler, so
//! each decision sees the value as it is at that moment.
//!
//! Every issued search carries a [`QueryTicket`]. A completion is applied only
//! if its ticket is the latest one issued; late answers to superseded queries
//! are dropped, whatever order they arrive in.

use super::labels::LabelCache;
use super::option::{OptionId, SelectOption};
use super::provider::SearchError;
use super::selection::Selection;
use super::view::{SelectView, SelectedItem, status_message};
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Default)]
pub struct SelectConfig {
    pub label: String,
    /// Opaque to the control; handed to the search collaborator.
    pub endpoint: String,
    pub placeholder: String,
    pub disabled: bool,
}

impl SelectConfig {
    pub fn new(label: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Backspace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEvent<Id> {
    Focus,
    Blur,
    /// New contents of the text input.
    Input(String),
    Key(Key),
    /// Pointer selection of the rendered option at this index.
    Click(usize),
    /// Remove affordance on a selected tag.
    Remove(Id),
    /// Clear affordance of a single select.
    Clear,
}

/// Correlates a search completion with the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: QueryTicket,
    pub endpoint: String,
}

impl SearchRequest {
    pub fn query(&self) -> &str {
        &self.ticket.query
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse<Id> {
    pub ticket: QueryTicket,
    pub outcome: Result<Vec<SelectOption<Id>>, SearchError>,
}

/// Committed ids that need labels from the selected-options resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest<Id> {
    pub generation: u64,
    pub endpoint: String,
    pub ids: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolveResponse<Id> {
    /// Generation of the [`ResolveRequest`] this answers.
    pub generation: u64,
    pub outcome: Result<Vec<SelectOption<Id>>, SearchError>,
}

/// What a handler wants the owner to do.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Update<V> {
    /// New committed value for the owner's change callback.
    pub change: Option<V>,
    /// Search the owner must hand to the search collaborator.
    pub search: Option<SearchRequest>,
}

impl<V> Update<V> {
    pub fn none() -> Self {
        Self {
            change: None,
            search: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.change.is_none() && self.search.is_none()
    }
}

/// Observable state of the dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectPhase {
    Closed,
    Loading,
    WithResults,
    Empty,
    Error(SearchError),
}

#[derive(Debug, Clone)]
enum Results<Id> {
    Pending,
    Loaded(Vec<SelectOption<Id>>),
    Failed(SearchError),
}

#[derive(Debug, Clone)]
pub struct SelectControl<Id, V> {
    config: SelectConfig,
    query: String,
    open: bool,
    results: Results<Id>,
    /// Highlighted index into the rendered options, if any.
    active: Option<usize>,
    /// Latest issued search; only its completion is applied.
    ticket: Option<QueryTicket>,
    generation: u64,
    labels: LabelCache<Id>,
    /// Latest resolver request still awaiting an answer.
    resolving: Option<ResolveRequest<Id>>,
    resolve_generation: u64,
    resolve_error: Option<SearchError>,
    _value: PhantomData<fn() -> V>,
}

/// Single-value control.
pub type SingleSelect<Id> = SelectControl<Id, Option<Id>>;

/// Multi-value control.
pub type MultiSelect<Id> = SelectControl<Id, indexmap::IndexSet<Id>>;

impl<Id: OptionId, V: Selection<Id>> SelectControl<Id, V> {
    pub fn new(config: SelectConfig) -> Self {
        Self {
            config,
            query: String::new(),
            open: false,
            results: Results::Pending,
            active: None,
            ticket: None,
            generation: 0,
            labels: LabelCache::new(),
            resolving: None,
            resolve_generation: 0,
            resolve_error: None,
            _value: PhantomData,
        }
    }

    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn labels(&self) -> &LabelCache<Id> {
        &self.labels
    }

    /// Options from the latest applied search. Empty while loading or failed.
    pub fn options(&self) -> &[SelectOption<Id>] {
        match &self.results {
            Results::Loaded(options) => options,
            Results::Pending | Results::Failed(_) => &[],
        }
    }

    /// Options actually on screen: nothing while closed.
    pub fn rendered_options(&self) -> &[SelectOption<Id>] {
        if self.open { self.options() } else { &[] }
    }

    pub fn phase(&self) -> SelectPhase {
        if !self.open {
            return SelectPhase::Closed;
        }
        match &self.results {
            Results::Pending => SelectPhase::Loading,
            Results::Loaded(options) if options.is_empty() => SelectPhase::Empty,
            Results::Loaded(_) => SelectPhase::WithResults,
            Results::Failed(e) => SelectPhase::Error(e.clone()),
        }
    }

    /// Enable or disable the control. Disabling closes it and orphans any
    /// search in flight.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.disabled = disabled;
        if disabled {
            self.open = false;
            self.active = None;
            self.ticket = None;
        }
    }

    pub fn handle(&mut self, event: SelectEvent<Id>, value: &V) -> Update<V> {
        if self.config.disabled {
            trace!(endpoint = self.config.endpoint, ?event, "ignoring event on disabled select");
            return Update::none();
        }

        match event {
            SelectEvent::Focus => self.focus(),
            SelectEvent::Blur => self.blur(value),
            SelectEvent::Input(text) => self.input(text),
            SelectEvent::Key(key) => self.key(key, value),
            SelectEvent::Click(index) => match self.rendered_options().get(index).cloned() {
                Some(option) => self.commit(option, value),
                None => Update::none(),
            },
            SelectEvent::Remove(id) => Update {
                change: value.remove(&id),
                search: None,
            },
            SelectEvent::Clear => Update {
                change: (!value.is_empty()).then(V::default),
                search: None,
            },
        }
    }

    /// Apply a search completion. Returns `false` if it was stale and dropped.
    pub fn deliver(&mut self, response: SearchResponse<Id>) -> bool {
        if self.ticket.as_ref() != Some(&response.ticket) {
            debug!(
                endpoint = self.config.endpoint,
                generation = response.ticket.generation,
                query = response.ticket.query,
                "discarding stale search results"
            );
            return false;
        }

        self.active = None;
        self.results = match response.outcome {
            Ok(options) => {
                self.labels.remember_all(&options);
                debug!(
                    endpoint = self.config.endpoint,
                    query = response.ticket.query,
                    count = options.len(),
                    "search results applied"
                );
                Results::Loaded(options)
            }
            Err(e) => {
                warn!(endpoint = self.config.endpoint, error = %e, "search failed");
                Results::Failed(e)
            }
        };
        true
    }

    /// Committed ids whose labels are unknown.
    pub fn pending_labels(&self, value: &V) -> Vec<Id> {
        self.labels.missing(value.ids())
    }

    /// Issue a resolver request for unknown labels, unless there are none or
    /// the latest request in flight already covers them.
    pub fn request_labels(&mut self, value: &V) -> Option<ResolveRequest<Id>> {
        let ids = self.pending_labels(value);
        if ids.is_empty() {
            return None;
        }
        if let Some(inflight) = &self.resolving
            && ids.iter().all(|id| inflight.ids.contains(id))
        {
            trace!(endpoint = self.config.endpoint, "labels already being resolved");
            return None;
        }

        self.resolve_generation += 1;
        let request = ResolveRequest {
            generation: self.resolve_generation,
            endpoint: self.config.endpoint.clone(),
            ids,
        };
        self.resolving = Some(request.clone());
        Some(request)
    }

    /// Apply a resolver answer. Labels are kept from any answer, but only the
    /// latest request may set or clear the resolver error. Returns `false`
    /// for an answer to a superseded request.
    pub fn deliver_resolved(&mut self, response: ResolveResponse<Id>) -> bool {
        if let Ok(options) = &response.outcome {
            self.labels.remember_all(options);
        }

        let current = self
            .resolving
            .as_ref()
            .is_some_and(|r| r.generation == response.generation);
        if !current {
            debug!(
                endpoint = self.config.endpoint,
                generation = response.generation,
                "discarding stale resolver answer"
            );
            return false;
        }
        self.resolving = None;

        match response.outcome {
            Ok(_) => self.resolve_error = None,
            Err(e) => {
                warn!(endpoint = self.config.endpoint, error = %e, "failed to resolve selected options");
                self.resolve_error = Some(e);
            }
        }
        true
    }

    pub fn view(&self, value: &V) -> SelectView<Id> {
        let phase = self.phase();
        let selected = value
            .ids()
            .into_iter()
            .map(|id| SelectedItem {
                id: id.clone(),
                label: self.labels.label(id).map(str::to_owned),
            })
            .collect::<Vec<_>>();

        let input_text = if self.open || !self.query.is_empty() || V::MULTIPLE {
            self.query.clone()
        } else {
            selected
                .first()
                .and_then(|item| item.label.clone())
                .unwrap_or_default()
        };

        SelectView {
            label: self.config.label.clone(),
            placeholder: self.config.placeholder.clone(),
            message: status_message(&phase, &self.query),
            phase,
            query: self.query.clone(),
            input_text,
            options: self.rendered_options().to_vec(),
            active_index: self.active,
            selected,
            selection_error: self.resolve_error.clone(),
            disabled: self.config.disabled,
        }
    }

    fn focus(&mut self) -> Update<V> {
        if self.open {
            return Update::none();
        }
        self.open = true;
        Update {
            change: None,
            search: Some(self.issue_search()),
        }
    }

    fn input(&mut self, text: String) -> Update<V> {
        if self.open && text == self.query {
            return Update::none();
        }
        self.query = text;
        self.open = true;
        Update {
            change: None,
            search: Some(self.issue_search()),
        }
    }

    fn key(&mut self, key: Key, value: &V) -> Update<V> {
        match key {
            Key::ArrowDown | Key::ArrowUp if !self.open => self.focus(),
            Key::ArrowDown => {
                self.move_active(1);
                Update::none()
            }
            Key::ArrowUp => {
                self.move_active(-1);
                Update::none()
            }
            Key::Enter => {
                if !self.open {
                    return Update::none();
                }
                let target = match self.active {
                    Some(index) => self.options().get(index).cloned(),
                    None => self.exact_match(value),
                };
                match target {
                    Some(option) => self.commit(option, value),
                    None => Update::none(),
                }
            }
            Key::Escape => {
                self.close();
                Update::none()
            }
            Key::Backspace => {
                if !self.query.is_empty() {
                    // Text editing arrives as Input.
                    return Update::none();
                }
                Update {
                    change: value.pop_last(),
                    search: None,
                }
            }
        }
    }

    /// Move the highlight by one step, clamped to the list with no wraparound.
    fn move_active(&mut self, step: isize) {
        let len = self.options().len();
        if len == 0 {
            self.active = None;
            return;
        }
        self.active = Some(match self.active {
            None => 0,
            Some(index) => index.saturating_add_signed(step).min(len - 1),
        });
    }

    fn blur(&mut self, value: &V) -> Update<V> {
        let change = if self.open {
            self.exact_match(value)
                .and_then(|option| self.commit(option, value).change)
        } else {
            None
        };
        self.query.clear();
        self.close();
        Update {
            change,
            search: None,
        }
    }

    /// The one rendered, unselected option whose label equals the query.
    fn exact_match(&self, value: &V) -> Option<SelectOption<Id>> {
        if self.query.is_empty() {
            return None;
        }
        let mut matches = self
            .options()
            .iter()
            .filter(|o| o.label == self.query && !value.contains(&o.id));
        let first = matches.next()?;
        if matches.next().is_some() {
            debug!(query = self.query, "ambiguous exact match, not committing");
            return None;
        }
        Some(first.clone())
    }

    fn commit(&mut self, option: SelectOption<Id>, value: &V) -> Update<V> {
        let Some(change) = value.commit(option.id.clone()) else {
            return Update::none();
        };
        self.labels.remember(&option);
        debug!(endpoint = self.config.endpoint, id = ?option.id, "option committed");

        if V::MULTIPLE {
            let search = if self.query.is_empty() {
                None
            } else {
                self.query.clear();
                Some(self.issue_search())
            };
            Update {
                change: Some(change),
                search,
            }
        } else {
            self.query.clear();
            self.close();
            Update {
                change: Some(change),
                search: None,
            }
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.active = None;
    }

    fn issue_search(&mut self) -> SearchRequest {
        self.generation += 1;
        let ticket = QueryTicket {
            generation: self.generation,
            query: self.query.clone(),
        };
        self.ticket = Some(ticket.clone());
        self.results = Results::Pending;
        self.active = None;
        trace!(
            endpoint = self.config.endpoint,
            generation = ticket.generation,
            query = ticket.query,
            "search issued"
        );
        SearchRequest {
            ticket,
            endpoint: self.config.endpoint.clone(),
        }
    }
}
