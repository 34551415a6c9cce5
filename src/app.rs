use crate::auth::AuthState;
use crate::cli::{AuthCommand, CacheCommand, Command, SearchArgs};
use crate::config::Config;
use crate::embed_cache::EmbedCache;
use crate::json::parse_json_with_context;
use crate::select::{
    Combobox, DriverConfig, HttpSearchProvider, SearchDriver, SearchProvider, SelectConfig,
    SelectEvent, SelectOption, SelectPhase, SelectedOptionsResolver, SingleSelect, StaticOptions,
};
use crate::store::FileStore;
use crate::utils::fmt_duration;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Identifier of an API record; the API uses numeric ids for most resources
/// and string slugs for a few.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Slug(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Slug(s) => f.write_str(s),
        }
    }
}

/// Main application struct: configuration plus the shared store.
pub struct App {
    config: Config,
    store: Arc<FileStore>,
}

impl App {
    pub fn new(config: Config, store_override: Option<PathBuf>) -> Result<Self, anyhow::Error> {
        let store_path = store_override.unwrap_or_else(|| config.store_path.clone());
        let store = FileStore::open(&store_path)
            .with_context(|| format!("Failed to open store at {}", store_path.display()))?;
        debug!(store = %store_path.display(), "store opened");
        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    pub async fn run(self, command: Command) -> Result<ExitCode, anyhow::Error> {
        match command {
            Command::Cache(cmd) => Ok(self.cache(cmd)),
            Command::Auth(cmd) => self.auth(cmd),
            Command::Search(args) => self.search(args).await,
        }
    }

    fn cache(&self, command: CacheCommand) -> ExitCode {
        let cache = EmbedCache::new(self.store.clone()).with_default_ttl(self.config.cache_ttl);
        match command {
            CacheCommand::Get {
                resource,
                slug,
                variant,
            } => match cache.get(&resource, &slug, &variant) {
                Some(values) => {
                    for value in values {
                        println!("{value}");
                    }
                    ExitCode::SUCCESS
                }
                None => ExitCode::FAILURE,
            },
            CacheCommand::Set {
                resource,
                slug,
                variant,
                values,
                ttl,
            } => {
                let ttl = ttl.unwrap_or(cache.default_ttl());
                cache.set_with_ttl(&resource, &slug, values, &variant, ttl);
                info!(resource, slug, variant, ttl = fmt_duration(ttl), "embed cache row written");
                ExitCode::SUCCESS
            }
            CacheCommand::Clear {
                resource,
                slug,
                variant,
            } => {
                cache.clear(&resource, &slug, &variant);
                ExitCode::SUCCESS
            }
            CacheCommand::ClearAll => {
                let removed = cache.clear_all();
                println!("removed {removed} cached entries");
                ExitCode::SUCCESS
            }
        }
    }

    fn auth(&self, command: AuthCommand) -> Result<ExitCode, anyhow::Error> {
        let mut auth = AuthState::load(self.store.clone()).context("Failed to load auth state")?;
        match command {
            AuthCommand::Login { token } => {
                auth.set_token(token).context("Failed to store token")?;
                println!("logged in");
            }
            AuthCommand::Logout => {
                auth.clear().context("Failed to clear token")?;
                println!("logged out");
            }
            AuthCommand::Status => {
                if !auth.is_authenticated() {
                    println!("not logged in");
                    return Ok(ExitCode::FAILURE);
                }
                println!("logged in");
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn search(&self, args: SearchArgs) -> Result<ExitCode, anyhow::Error> {
        let (provider, resolver): (
            Arc<dyn SearchProvider<RecordId>>,
            Arc<dyn SelectedOptionsResolver<RecordId>>,
        ) = match &args.options {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let options: Vec<SelectOption<RecordId>> = parse_json_with_context(&raw)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                let provider = Arc::new(StaticOptions::new(options));
                let search: Arc<dyn SearchProvider<RecordId>> = provider.clone();
                let resolve: Arc<dyn SelectedOptionsResolver<RecordId>> = provider;
                (search, resolve)
            }
            None => {
                let auth = AuthState::load(self.store.clone()).context("Failed to load auth state")?;
                let base = Url::parse(&self.config.api_base_url)
                    .with_context(|| format!("Invalid API base URL {}", self.config.api_base_url))?;
                let provider = Arc::new(
                    HttpSearchProvider::new(base, self.config.http_timeout)
                        .context("Failed to build HTTP client")?
                        .with_bearer_token(auth.token().map(str::to_owned)),
                );
                let search: Arc<dyn SearchProvider<RecordId>> = provider.clone();
                let resolve: Arc<dyn SelectedOptionsResolver<RecordId>> = provider;
                (search, resolve)
            }
        };

        let driver = SearchDriver::new(
            provider,
            DriverConfig {
                debounce: self.config.search_debounce,
                cancel_superseded: true,
            },
        )
        .with_resolver(resolver);
        let control = SingleSelect::new(SelectConfig::new(args.endpoint.clone(), args.endpoint.clone()));
        let mut combobox = Combobox::new(control, driver);
        let value: Option<RecordId> = None;

        let start = Instant::now();
        let _ = combobox.handle(SelectEvent::Focus, &value);
        let _ = combobox.handle(SelectEvent::Input(args.query.clone()), &value);

        let deadline = self.config.search_debounce + self.config.http_timeout * 2;
        tokio::time::timeout(deadline, async {
            while combobox.control().phase() == SelectPhase::Loading {
                combobox.settle().await;
            }
        })
        .await
        .context("Search did not complete in time")?;
        debug!(duration = fmt_duration(start.elapsed()), "search settled");

        let view = combobox.view(&value);
        for (index, option) in view.options.iter().enumerate() {
            println!("{index:>3}  {}\t{}", option.id, option.label);
        }
        if let Some(message) = &view.message {
            println!("{message}");
        }
        if matches!(view.phase, SelectPhase::Error(_)) {
            return Ok(ExitCode::FAILURE);
        }

        if args.pick {
            return Ok(match combobox.handle(SelectEvent::Blur, &value) {
                Some(Some(id)) => {
                    println!("selected {id}");
                    ExitCode::SUCCESS
                }
                _ => {
                    println!("no option labelled \"{}\"", args.query);
                    ExitCode::FAILURE
                }
            });
        }

        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_accept_numbers_and_slugs() {
        let options: Vec<SelectOption<RecordId>> = serde_json::from_str(
            r#"[{"id": 12, "label": "Jazz"}, {"id": "summer-series", "name": "Summer Series"}]"#,
        )
        .unwrap();
        assert_eq!(options[0].id, RecordId::Number(12));
        assert_eq!(options[1].id.to_string(), "summer-series");
        assert_eq!(options[1].label, "Summer Series");
    }
}
