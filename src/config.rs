// Run configuration.
// Resolves CLI flags and environment into validated settings with defaults.

use std::path::PathBuf;

use crate::api::PostsQuery;
use crate::cache::paths;
use crate::cli::Cli;
use crate::error::{PostcacheError, Result};
use crate::oauth::ConsumerCredentials;

/// Settings for one fetch-and-export run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub consumer: ConsumerCredentials,
    pub cache_dir: PathBuf,
    pub out_dir: PathBuf,
    pub blog: String,
    pub limit: u32,
    pub filter: Option<String>,
    pub data_ttl_days: i64,
    pub creds_ttl_days: i64,
    pub refresh: bool,
    pub reauth: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let key = non_empty(cli.consumer_key.as_deref());
        let secret = non_empty(cli.consumer_secret.as_deref());
        let consumer = match (key, secret) {
            (Some(key), Some(secret)) => ConsumerCredentials::new(key, secret),
            _ => return Err(PostcacheError::MissingConsumerKey),
        };

        let cache_dir = cli
            .cache_dir
            .clone()
            .or_else(paths::cache_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            consumer,
            cache_dir,
            out_dir: cli.out_dir.clone(),
            blog: cli.blog.clone(),
            limit: cli.limit,
            filter: non_empty(Some(&cli.filter)).map(str::to_string),
            data_ttl_days: cli.ttl_days,
            creds_ttl_days: cli.creds_ttl_days,
            refresh: cli.refresh,
            reauth: cli.reauth,
        })
    }

    /// Query for posts of `post_type` with the configured limit and filter.
    pub fn posts_query(&self, post_type: &str) -> PostsQuery {
        PostsQuery {
            post_type: Some(post_type.to_string()),
            limit: self.limit,
            filter: self.filter.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
