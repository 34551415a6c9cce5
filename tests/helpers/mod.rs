#![allow(dead_code)]

use async_trait::async_trait;
use eventscape::select::{SearchError, SearchProvider, SelectOption};
use eventscape::store::{KeyValueStore, MemoryStore, StoreError};
use eventscape::warnings::WarningSink;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Collects warnings instead of logging them.
#[derive(Default)]
pub struct RecordingSink {
    pub warnings: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.warnings.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

impl WarningSink for RecordingSink {
    fn warn(&self, message: &str, error: &dyn std::error::Error) {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_owned(), error.to_string()));
    }
}

/// Wraps a `MemoryStore` and fails the operations that are switched on.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_remove: AtomicBool,
    pub fail_keys: AtomicBool,
    /// Removing exactly this key fails; other removals go through.
    pub failing_key: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn fail_removal_of(&self, key: impl Into<String>) {
        *self.failing_key.lock().unwrap() = Some(key.into());
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("simulated outage".to_owned())
}

impl KeyValueStore for FlakyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_remove.load(Ordering::SeqCst)
            || self.failing_key.lock().unwrap().as_deref() == Some(key)
        {
            return Err(unavailable());
        }
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_keys.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.keys()
    }
}

/// Scripted search provider: per-query options and latency, counting calls.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: HashMap<String, (Duration, Result<Vec<SelectOption<u32>>, SearchError>)>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: &str, delay: Duration, options: Vec<SelectOption<u32>>) -> Self {
        self.responses.insert(query.to_owned(), (delay, Ok(options)));
        self
    }

    pub fn fail(mut self, query: &str, error: SearchError) -> Self {
        self.responses
            .insert(query.to_owned(), (Duration::ZERO, Err(error)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider<u32> for ScriptedProvider {
    async fn search(&self, _endpoint: &str, query: &str) -> Result<Vec<SelectOption<u32>>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_owned());
        let (delay, outcome) = self
            .responses
            .get(query)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(Vec::new())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

pub fn two_options() -> Vec<SelectOption<u32>> {
    vec![SelectOption::new(1, "Option 1"), SelectOption::new(2, "Option 2")]
}
