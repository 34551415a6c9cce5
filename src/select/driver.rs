//! Runs a [`SelectControl`]'s searches on tokio.
//!
//! Completions come back over a channel in whatever order the collaborators
//! finish. The control's tickets decide what is applied; aborting superseded
//! tasks and skipping them after the debounce only saves work.

use super::control::{
    ResolveRequest, ResolveResponse, SearchRequest, SearchResponse, SelectControl, SelectEvent,
};
use super::option::OptionId;
use super::provider::{SearchProvider, SelectedOptionsResolver};
use super::selection::Selection;
use super::view::SelectView;
use crate::utils::log_if_slow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const SLOW_SEARCH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum DriverMessage<Id> {
    Search(SearchResponse<Id>),
    Resolved(ResolveResponse<Id>),
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Wait this long before calling the provider; newer queries issued in
    /// the meantime make the older one skip its call.
    pub debounce: Duration,
    /// Abort the previous search task when a new one is dispatched.
    pub cancel_superseded: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::ZERO,
            cancel_superseded: true,
        }
    }
}

pub struct SearchDriver<Id: OptionId> {
    provider: Arc<dyn SearchProvider<Id>>,
    resolver: Option<Arc<dyn SelectedOptionsResolver<Id>>>,
    config: DriverConfig,
    /// Generation of the most recently dispatched search.
    latest: Arc<AtomicU64>,
    inflight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<DriverMessage<Id>>,
    rx: mpsc::UnboundedReceiver<DriverMessage<Id>>,
}

impl<Id: OptionId> SearchDriver<Id> {
    pub fn new(provider: Arc<dyn SearchProvider<Id>>, config: DriverConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            resolver: None,
            config,
            latest: Arc::new(AtomicU64::new(0)),
            inflight: None,
            tx,
            rx,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SelectedOptionsResolver<Id>>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Start a search task for `request`.
    pub fn dispatch(&mut self, request: SearchRequest) {
        let generation = request.ticket.generation;
        self.latest.store(generation, Ordering::Release);

        if self.config.cancel_superseded
            && let Some(previous) = self.inflight.take()
        {
            previous.abort();
        }

        let provider = self.provider.clone();
        let latest = self.latest.clone();
        let tx = self.tx.clone();
        let debounce = self.config.debounce;

        self.inflight = Some(tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
                if latest.load(Ordering::Acquire) != generation {
                    trace!(generation, "search superseded during debounce");
                    return;
                }
            }

            let start = Instant::now();
            let outcome = provider.search(&request.endpoint, request.query()).await;
            log_if_slow(start, SLOW_SEARCH, "option search");

            // The receiver only goes away with the driver.
            let _ = tx.send(DriverMessage::Search(SearchResponse {
                ticket: request.ticket,
                outcome,
            }));
        }));
    }

    /// Look up labels for committed ids. A no-op without a resolver.
    pub fn resolve(&self, request: ResolveRequest<Id>) {
        let Some(resolver) = self.resolver.clone() else {
            debug!(endpoint = request.endpoint, "no resolver configured, labels stay unknown");
            return;
        };
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = resolver.resolve(&request.endpoint, &request.ids).await;
            let _ = tx.send(DriverMessage::Resolved(ResolveResponse {
                generation: request.generation,
                outcome,
            }));
        });
    }

    /// Stop the pending search, whether it is still debouncing or already
    /// calling the provider.
    pub fn cancel(&mut self) {
        // Tickets start at generation 1, so 0 matches no dispatched task.
        self.latest.store(0, Ordering::Release);
        if let Some(handle) = self.inflight.take() {
            handle.abort();
            trace!("pending search cancelled");
        }
    }

    /// Wait for the next completion.
    pub async fn next(&mut self) -> Option<DriverMessage<Id>> {
        self.rx.recv().await
    }
}

impl<Id: OptionId> Drop for SearchDriver<Id> {
    fn drop(&mut self) {
        if let Some(handle) = self.inflight.take() {
            handle.abort();
        }
    }
}

/// A select control wired to its driver.
pub struct Combobox<Id: OptionId, V> {
    control: SelectControl<Id, V>,
    driver: SearchDriver<Id>,
}

impl<Id: OptionId, V: Selection<Id>> Combobox<Id, V> {
    pub fn new(control: SelectControl<Id, V>, driver: SearchDriver<Id>) -> Self {
        Self { control, driver }
    }

    pub fn control(&self) -> &SelectControl<Id, V> {
        &self.control
    }

    /// Disabling also cancels the search in flight, so no query reaches the
    /// provider afterwards.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.control.set_disabled(disabled);
        if disabled {
            self.driver.cancel();
        }
    }

    /// Feed a UI event. Returns the new committed value, if the event changed it.
    pub fn handle(&mut self, event: SelectEvent<Id>, value: &V) -> Option<V> {
        let update = self.control.handle(event, value);
        if let Some(request) = update.search {
            self.driver.dispatch(request);
        }
        update.change
    }

    /// Ask the resolver for labels of committed ids the control has not seen.
    pub fn sync_labels(&mut self, value: &V) {
        if let Some(request) = self.control.request_labels(value) {
            self.driver.resolve(request);
        }
    }

    /// Wait for one completion and apply it. Returns whether it was current;
    /// stale answers are dropped, apart from the labels they carry.
    pub async fn settle(&mut self) -> bool {
        match self.driver.next().await {
            Some(DriverMessage::Search(response)) => self.control.deliver(response),
            Some(DriverMessage::Resolved(response)) => self.control.deliver_resolved(response),
            None => false,
        }
    }

    pub fn view(&self, value: &V) -> SelectView<Id> {
        self.control.view(value)
    }
}
