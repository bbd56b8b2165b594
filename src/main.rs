// postcache entry point.
// Fetches a blog's photo and text posts through the caches and writes the CSV files.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postcache::api::{ApiClient, SERVICE_NAME};
use postcache::cache::{CacheStore, LocalClock, creds_cache_path, data_cache_path};
use postcache::cli::Cli;
use postcache::config::Config;
use postcache::export::export_all;
use postcache::oauth::{InteractiveOAuth, OAuthEndpoints};
use postcache::{Fetcher, Result};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("postcache={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli)?;

    let data = CacheStore::open(data_cache_path(&config.cache_dir))?;
    let creds = CacheStore::open(creds_cache_path(&config.cache_dir))?;
    let provider = InteractiveOAuth::new(config.consumer.clone(), OAuthEndpoints::tumblr())?;
    let client = ApiClient::new()?;

    let mut fetcher = Fetcher::new(
        data,
        creds,
        Box::new(provider),
        Box::new(client),
        Arc::new(LocalClock),
    )
    .with_creds_ttl_days(config.creds_ttl_days);

    if config.reauth && fetcher.forget_credentials(SERVICE_NAME)? {
        info!("discarded cached credentials");
    }

    let photo_query = config.posts_query("photo");
    let text_query = config.posts_query("text");
    if config.refresh {
        fetcher.invalidate_blog_posts(&config.blog, &photo_query)?;
        fetcher.invalidate_blog_posts(&config.blog, &text_query)?;
    }

    let photo_posts = fetcher
        .blog_posts(&config.blog, &photo_query, config.data_ttl_days)
        .await?;
    let text_posts = fetcher
        .blog_posts(&config.blog, &text_query, config.data_ttl_days)
        .await?;
    info!(
        photo = photo_posts.len(),
        text = text_posts.len(),
        blog = %config.blog,
        "loaded posts"
    );

    export_all(&config.out_dir, &photo_posts, &text_posts)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
