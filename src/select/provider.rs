//! Collaborators that produce options for a select control.

use super::option::{OptionId, SelectOption};
use async_trait::async_trait;

/// Failure of a search or label lookup. Cloneable so the control can keep it
/// on screen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Free-text search against an endpoint (`events`, `entities`, `tags`, ...).
#[async_trait]
pub trait SearchProvider<Id: OptionId>: Send + Sync {
    async fn search(&self, endpoint: &str, query: &str) -> Result<Vec<SelectOption<Id>>, SearchError>;
}

/// Label lookup for ids that are committed but not in the current results.
#[async_trait]
pub trait SelectedOptionsResolver<Id: OptionId>: Send + Sync {
    async fn resolve(&self, endpoint: &str, ids: &[Id]) -> Result<Vec<SelectOption<Id>>, SearchError>;
}

const DEFAULT_LIMIT: usize = 25;

/// A fixed option list that filters locally.
///
/// Matches labels containing the query (case-insensitive). An empty query
/// returns the first `limit` options.
#[derive(Debug, Clone)]
pub struct StaticOptions<Id> {
    options: Vec<SelectOption<Id>>,
    limit: usize,
}

impl<Id: OptionId> StaticOptions<Id> {
    pub fn new(options: Vec<SelectOption<Id>>) -> Self {
        Self {
            options,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(&self, query: &str) -> Vec<SelectOption<Id>> {
        let query_lower = query.trim().to_lowercase();
        self.options
            .iter()
            .filter(|o| query_lower.is_empty() || o.label.to_lowercase().contains(&query_lower))
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<Id: OptionId> SearchProvider<Id> for StaticOptions<Id> {
    async fn search(&self, _endpoint: &str, query: &str) -> Result<Vec<SelectOption<Id>>, SearchError> {
        Ok(self.filter(query))
    }
}

#[async_trait]
impl<Id: OptionId> SelectedOptionsResolver<Id> for StaticOptions<Id> {
    async fn resolve(&self, _endpoint: &str, ids: &[Id]) -> Result<Vec<SelectOption<Id>>, SearchError> {
        Ok(self
            .options
            .iter()
            .filter(|o| ids.contains(&o.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venues() -> StaticOptions<u32> {
        StaticOptions::new(vec![
            SelectOption::new(1, "Mercury Lounge"),
            SelectOption::new(2, "Bowery Ballroom"),
            SelectOption::new(3, "Music Hall of Williamsburg"),
        ])
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let ids: Vec<u32> = venues().filter("LOUNGE").into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1]);

        let ids: Vec<u32> = venues().filter("mu").into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn empty_query_returns_default_set_up_to_limit() {
        assert_eq!(venues().with_limit(2).filter("").len(), 2);
    }

    #[tokio::test]
    async fn resolve_returns_known_ids() {
        let found = venues().resolve("entities", &[3, 9]).await.unwrap();
        assert_eq!(found, vec![SelectOption::new(3, "Music Hall of Williamsburg")]);
    }
}
