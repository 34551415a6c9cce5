//! Search collaborator backed by the application's REST API.
//!
//! `GET {base}/{endpoint}?search=<query>` returns a JSON list of
//! `{"id": .., "label"|"name": ..}` objects; the same endpoint with repeated
//! `ids=<id>` parameters returns the options for those ids.

use super::option::{OptionId, SelectOption};
use super::provider::{SearchError, SearchProvider, SelectedOptionsResolver};
use crate::json::parse_json_with_context;
use crate::utils::{fmt_duration, log_if_slow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const SLOW_REQUEST: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct HttpSearchProvider {
    client: reqwest::Client,
    base_url: Url,
    search_param: String,
    ids_param: String,
    bearer_token: Option<String>,
}

impl HttpSearchProvider {
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, SearchError> {
        // `Url::join` replaces the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Request(e.to_string()))?;
        debug!(base_url = %base_url, timeout = fmt_duration(timeout), "search client ready");
        Ok(Self {
            client,
            base_url,
            search_param: "search".to_owned(),
            ids_param: "ids".to_owned(),
            bearer_token: None,
        })
    }

    /// Attach the session token to every request.
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn with_search_param(mut self, param: impl Into<String>) -> Self {
        self.search_param = param.into();
        self
    }

    pub fn search_url(&self, endpoint: &str, query: &str) -> Result<Url, SearchError> {
        let mut url = self.endpoint_url(endpoint)?;
        if !query.is_empty() {
            url.query_pairs_mut().append_pair(&self.search_param, query);
        }
        Ok(url)
    }

    pub fn resolve_url<Id: Display>(&self, endpoint: &str, ids: &[Id]) -> Result<Url, SearchError> {
        let mut url = self.endpoint_url(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair(&self.ids_param, &id.to_string());
            }
        }
        Ok(url)
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| SearchError::Request(format!("invalid endpoint {endpoint:?}: {e}")))
    }

    async fn fetch<Id: DeserializeOwned>(&self, url: Url) -> Result<Vec<SelectOption<Id>>, SearchError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        log_if_slow(start, SLOW_REQUEST, "option search request");

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let options: Vec<SelectOption<Id>> =
            parse_json_with_context(&body).map_err(|e| SearchError::Decode(e.to_string()))?;
        debug!(%url, count = options.len(), duration = fmt_duration(start.elapsed()), "options fetched");
        Ok(options)
    }
}

#[async_trait]
impl<Id> SearchProvider<Id> for HttpSearchProvider
where
    Id: OptionId + DeserializeOwned,
{
    async fn search(&self, endpoint: &str, query: &str) -> Result<Vec<SelectOption<Id>>, SearchError> {
        let url = self.search_url(endpoint, query)?;
        self.fetch(url).await
    }
}

#[async_trait]
impl<Id> SelectedOptionsResolver<Id> for HttpSearchProvider
where
    Id: OptionId + DeserializeOwned + Display,
{
    async fn resolve(&self, endpoint: &str, ids: &[Id]) -> Result<Vec<SelectOption<Id>>, SearchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.resolve_url(endpoint, ids)?;
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> HttpSearchProvider {
        HttpSearchProvider::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn search_url_appends_endpoint_and_query() {
        let p = provider("https://example.com/api");
        let url = p.search_url("entities", "mercury lounge").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/entities?search=mercury+lounge");
    }

    #[test]
    fn empty_query_has_no_search_param() {
        let p = provider("https://example.com/api/");
        let url = p.search_url("/tags", "").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/tags");
    }

    #[test]
    fn resolve_url_repeats_ids() {
        let p = provider("https://example.com/api/");
        let url = p.resolve_url("tags", &[3, 14]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/tags?ids=3&ids=14");
    }

    #[test]
    fn custom_search_param() {
        let p = provider("https://example.com/api/").with_search_param("name");
        let url = p.search_url("series", "jazz").unwrap();
        assert_eq!(url.query(), Some("name=jazz"));
    }
}
