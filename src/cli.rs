// Command-line interface parsing.
// Flags and environment variables for the fetch-and-export run.

use std::path::PathBuf;

use clap::Parser;

use crate::fetch::{DEFAULT_CREDS_TTL_DAYS, DEFAULT_DATA_TTL_DAYS};

/// Fetch a Tumblr blog's photo and text posts through a local TTL cache and export them to CSV
#[derive(Parser, Debug)]
#[command(name = "postcache")]
#[command(version)]
pub struct Cli {
    /// Blog to read, e.g. nbcnews.tumblr.com
    #[arg(long, default_value = "nbcnews.tumblr.com")]
    pub blog: String,

    /// Posts to request per query
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Body format filter sent to the API (text, raw); empty for HTML
    #[arg(long, default_value = "text")]
    pub filter: String,

    /// Directory the CSV files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Directory holding cache_contents.json and creds.json
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Days an API response stays cached
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_DATA_TTL_DAYS, allow_negative_numbers = true)]
    pub ttl_days: i64,

    /// Days OAuth credentials stay cached
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_CREDS_TTL_DAYS, allow_negative_numbers = true)]
    pub creds_ttl_days: i64,

    /// Ignore cached responses for this run's queries
    #[arg(long)]
    pub refresh: bool,

    /// Discard cached credentials and authorize again
    #[arg(long)]
    pub reauth: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    /// OAuth consumer key
    #[arg(long, env = "TUMBLR_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    /// OAuth consumer secret
    #[arg(long, env = "TUMBLR_CONSUMER_SECRET", hide_env_values = true)]
    pub consumer_secret: Option<String>,
}
