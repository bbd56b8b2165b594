// Tumblr API HTTP client.
// Signs each request with OAuth1 credentials and maps response statuses to errors.

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::cache::{ParamValue, query_pairs};
use crate::error::{PostcacheError, Result};
use crate::fetch::HttpFetcher;
use crate::oauth::TokenSet;

/// HTTP client for OAuth1-protected API endpoints.
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("postcache/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(PostcacheError::Http)?;

        Ok(Self { client })
    }

    /// Make a signed GET request with query parameters.
    pub async fn get(
        &self,
        url: &str,
        params: &[(String, ParamValue)],
        tokens: &TokenSet,
    ) -> Result<Response> {
        let query = query_pairs(params);
        let auth = tokens.signer().authorization("GET", url, &query, &[])?;

        let response = self
            .client
            .get(url)
            .query(&query)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(PostcacheError::Http)?;

        debug!(url, status = %response.status(), "API response");
        check_response(response).await
    }
}

#[async_trait]
impl HttpFetcher for ApiClient {
    async fn get_text(
        &self,
        url: &str,
        params: &[(String, ParamValue)],
        tokens: &TokenSet,
    ) -> Result<String> {
        let response = self.get(url, params, tokens).await?;
        Ok(response.text().await?)
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(PostcacheError::Unauthorized),
        StatusCode::NOT_FOUND => {
            let url = response.url().to_string();
            Err(PostcacheError::NotFound(url))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(PostcacheError::RateLimited),
        status => Err(PostcacheError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::params;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn tokens() -> TokenSet {
        TokenSet {
            client_key: "ck".into(),
            client_secret: "cs".into(),
            resource_owner_key: "rk".into(),
            resource_owner_secret: "rs".into(),
            verifier: None,
        }
    }

    fn local_client() -> ApiClient {
        ApiClient {
            client: Client::builder().no_proxy().build().unwrap(),
        }
    }

    /// Serve one canned response and return the URL to request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        format!("http://127.0.0.1:{}/v2/blog/example.tumblr.com/posts/", port)
    }

    async fn get_text(status_line: &'static str, body: &'static str) -> (String, Result<String>) {
        let url = serve_once(status_line, body).await;
        let query = params([("limit", 2u32)]);
        let result = local_client().get_text(&url, &query, &tokens()).await;
        (url, result)
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let (_, result) = get_text("200 OK", r#"{"response":{"posts":[]}}"#).await;
        assert_eq!(result.unwrap(), r#"{"response":{"posts":[]}}"#);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (_, result) = get_text("401 Unauthorized", "{}").await;
        assert!(matches!(result, Err(PostcacheError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_not_found_names_url() {
        let (url, result) = get_text("404 Not Found", "{}").await;
        match result {
            Err(PostcacheError::NotFound(missing)) => assert!(missing.starts_with(&url)),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let (_, result) = get_text("429 Too Many Requests", "{}").await;
        assert!(matches!(result, Err(PostcacheError::RateLimited)));
    }

    #[tokio::test]
    async fn test_other_status_carries_body() {
        let (_, result) = get_text("500 Internal Server Error", "upstream exploded").await;
        match result {
            Err(PostcacheError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }
}
