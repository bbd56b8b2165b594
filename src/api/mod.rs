// Tumblr API module.
// Provides the signing client, endpoint helpers, and post types.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::ApiClient;
pub use endpoints::{PostsQuery, SERVICE_NAME, blog_posts_url, parse_posts};
pub use types::{Post, PostKind};
