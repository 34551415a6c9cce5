use crate::config::parse_duration;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "eventscape", version, about = "Client tools for the event discovery API")]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty, global = true)]
    pub tracing: TracingFormat,

    /// Override the store file from config
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or modify the embed cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Manage the stored session token
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Run a typeahead search the way the select control does
    Search(SearchArgs),
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print cached values, one per line. Exits 1 on a miss.
    Get {
        resource: String,
        slug: String,
        variant: String,
    },
    Set {
        resource: String,
        slug: String,
        variant: String,
        #[arg(required = true)]
        values: Vec<String>,
        /// Lifetime such as `1h` or `7d`; defaults to the configured TTL
        #[arg(long, value_parser = parse_duration)]
        ttl: Option<Duration>,
    },
    Clear {
        resource: String,
        slug: String,
        variant: String,
    },
    /// Remove every embed cache row, leaving other stored data alone
    ClearAll,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    Login { token: String },
    Logout,
    Status,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// API endpoint to search (`events`, `entities`, `tags`, `series`)
    pub endpoint: String,
    pub query: String,
    /// Search a local JSON option list instead of the API
    #[arg(long)]
    pub options: Option<PathBuf>,
    /// Commit the option whose label equals the query exactly
    #[arg(long)]
    pub pick: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cache_set_with_ttl() {
        let args = Args::try_parse_from([
            "eventscape", "cache", "set", "events", "jazz-night", "minimal", "<a>", "<b>", "--ttl", "1h",
        ])
        .unwrap();
        match args.command {
            Command::Cache(CacheCommand::Set { values, ttl, .. }) => {
                assert_eq!(values, vec!["<a>", "<b>"]);
                assert_eq!(ttl, Some(Duration::from_secs(3600)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["eventscape", "auth", "status", "--tracing", "json"]).unwrap();
        assert_eq!(args.tracing, TracingFormat::Json);
    }
}
