// postcache library.
// TTL-cached, OAuth1-signed access to the Tumblr API plus CSV export of posts.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod oauth;

pub use error::{PostcacheError, Result};
pub use fetch::{CredentialProvider, Fetcher, HttpFetcher};
