// Tumblr API endpoint functions.
// Builds blog post requests and fetches them through the cached fetcher.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{Params, params};
use crate::error::Result;
use crate::fetch::Fetcher;

use super::types::Post;

/// Base URL for blog endpoints.
pub const BLOG_API_BASE: &str = "https://api.tumblr.com/v2/blog/";
/// Name the credential cache stores Tumblr tokens under.
pub const SERVICE_NAME: &str = "Tumblr";

/// Response wrapper for the posts endpoint.
#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    response: PostsResponse,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    posts: Vec<Value>,
}

/// URL of the posts endpoint for `blog`, e.g. `nbcnews.tumblr.com`.
pub fn blog_posts_url(blog: &str) -> String {
    format!("{}{}/posts/", BLOG_API_BASE, blog)
}

/// Query for a blog's posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsQuery {
    /// Restrict to one post type (`photo`, `text`, ...).
    pub post_type: Option<String>,
    pub limit: u32,
    /// Body format filter (`text`, `raw`); `None` returns HTML.
    pub filter: Option<String>,
}

impl PostsQuery {
    pub fn of_type(post_type: &str, limit: u32) -> Self {
        Self {
            post_type: Some(post_type.to_string()),
            limit,
            filter: Some("text".to_string()),
        }
    }

    pub fn params(&self) -> Params {
        let mut p = params([("limit", self.limit)]);
        if let Some(post_type) = &self.post_type {
            p.extend(params([("type", post_type.as_str())]));
        }
        if let Some(filter) = &self.filter {
            p.extend(params([("filter", filter.as_str())]));
        }
        p
    }
}

/// Decode the posts in a posts endpoint response.
pub fn parse_posts(response: &Value) -> Result<Vec<Post>> {
    let envelope = PostsEnvelope::deserialize(response)?;
    let posts = envelope
        .response
        .posts
        .iter()
        .map(Post::from_value)
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(posts)
}

impl Fetcher {
    /// Get posts for a blog, from cache when fresh.
    pub async fn blog_posts(
        &mut self,
        blog: &str,
        query: &PostsQuery,
        ttl_days: i64,
    ) -> Result<Vec<Post>> {
        let url = blog_posts_url(blog);
        let response = self
            .fetch(&url, &query.params(), SERVICE_NAME, ttl_days)
            .await?;
        parse_posts(&response)
    }

    /// Drop the cached response for a blog posts query.
    pub fn invalidate_blog_posts(&mut self, blog: &str, query: &PostsQuery) -> Result<bool> {
        self.invalidate(&blog_posts_url(blog), &query.params())
    }
}
