// Interactive OAuth 1.0a authorization.
// Request token, browser approval, pasted redirect URL, then the access token exchange.

use std::io::Write;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

use crate::error::{PostcacheError, Result};
use crate::fetch::CredentialProvider;

use super::{ConsumerCredentials, Signer, TokenSet};

const TUMBLR_REQUEST_TOKEN_URL: &str = "https://www.tumblr.com/oauth/request_token";
const TUMBLR_AUTHORIZE_URL: &str = "https://www.tumblr.com/oauth/authorize";
const TUMBLR_ACCESS_TOKEN_URL: &str = "https://www.tumblr.com/oauth/access_token";

/// Provider URLs for the three-legged flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
    /// Sent as `oauth_callback` when set; otherwise the registered callback applies.
    pub callback: Option<String>,
}

impl OAuthEndpoints {
    pub fn tumblr() -> Self {
        Self {
            request_token_url: TUMBLR_REQUEST_TOKEN_URL.to_string(),
            authorize_url: TUMBLR_AUTHORIZE_URL.to_string(),
            access_token_url: TUMBLR_ACCESS_TOKEN_URL.to_string(),
            callback: None,
        }
    }

    /// URL the user opens to approve access for `request_token`.
    pub fn authorization_url(&self, request_token: &str) -> Result<String> {
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            PostcacheError::Credentials(format!(
                "Invalid authorize URL {}: {}",
                self.authorize_url, e
            ))
        })?;
        url.query_pairs_mut().append_pair("oauth_token", request_token);
        Ok(url.into())
    }
}

/// A token and secret pair returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenPair {
    token: String,
    secret: String,
}

/// Credential provider that walks the user through browser authorization.
pub struct InteractiveOAuth {
    client: Client,
    consumer: ConsumerCredentials,
    endpoints: OAuthEndpoints,
}

impl InteractiveOAuth {
    pub fn new(consumer: ConsumerCredentials, endpoints: OAuthEndpoints) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            consumer,
            endpoints,
        })
    }

    async fn fetch_request_token(&self) -> Result<TokenPair> {
        let url = &self.endpoints.request_token_url;
        let extra: Vec<(&str, &str)> = self
            .endpoints
            .callback
            .as_deref()
            .map(|cb| ("oauth_callback", cb))
            .into_iter()
            .collect();

        let auth = Signer::new(&self.consumer.key, &self.consumer.secret)
            .authorization("POST", url, &[], &extra)?;
        let body = self.post_signed(url, auth, "request token").await?;
        parse_token_response(&body)
    }

    async fn fetch_access_token(&self, request: &TokenPair, verifier: &str) -> Result<TokenPair> {
        let url = &self.endpoints.access_token_url;
        let auth = Signer::new(&self.consumer.key, &self.consumer.secret)
            .with_token(&request.token, &request.secret)
            .authorization("POST", url, &[], &[("oauth_verifier", verifier)])?;
        let body = self.post_signed(url, auth, "access token").await?;
        parse_token_response(&body)
    }

    async fn post_signed(&self, url: &str, auth: String, what: &str) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PostcacheError::Credentials(format!(
                "{} request failed (HTTP {}): {}",
                what, status, body
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl CredentialProvider for InteractiveOAuth {
    async fn acquire(&self, service: &str) -> Result<TokenSet> {
        info!(service, "fetching fresh credentials; prepare to log in via browser");

        let request = self.fetch_request_token().await?;
        let auth_url = self.endpoints.authorization_url(&request.token)?;

        if let Err(e) = open_browser(&auth_url) {
            warn!(error = %e, "could not open browser");
        }
        eprintln!("Authorize access at:\n  {}\n", auth_url);

        let pasted = prompt("Paste the full redirect URL here: ").await?;
        let verifier = extract_verifier(&pasted)?;

        let access = self.fetch_access_token(&request, &verifier).await?;
        Ok(TokenSet {
            client_key: self.consumer.key.clone(),
            client_secret: self.consumer.secret.clone(),
            resource_owner_key: access.token,
            resource_owner_secret: access.secret,
            verifier: Some(verifier),
        })
    }
}

/// Parse an `oauth_token=..&oauth_token_secret=..` form body.
fn parse_token_response(body: &str) -> Result<TokenPair> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match &*key {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) => Ok(TokenPair { token, secret }),
        _ => Err(PostcacheError::Credentials(format!(
            "token response is missing oauth_token or oauth_token_secret: {}",
            body
        ))),
    }
}

/// Pull `oauth_verifier` out of a pasted redirect URL, or take the input as
/// the verifier itself when it is not a URL.
fn extract_verifier(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PostcacheError::Credentials("no verifier entered".into()));
    }

    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "oauth_verifier")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| {
                PostcacheError::Credentials("redirect URL has no oauth_verifier parameter".into())
            }),
        Err(_) => Ok(input.to_string()),
    }
}

/// Print `message` and read one line from stdin.
async fn prompt(message: &str) -> Result<String> {
    eprint!("{}", message);
    std::io::stderr().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim().to_string())
}

/// Open a URL in the user's default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        // Quote the URL so cmd.exe does not treat '&' as a command separator.
        let url = url.replace('"', "\\\"");
        let cmd = format!("start \"\" \"{}\"", url);
        std::process::Command::new("cmd").args(["/C", &cmd]).spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let pair = parse_token_response(
            "oauth_token=abc&oauth_token_secret=s%2Bcret&oauth_callback_confirmed=true",
        )
        .unwrap();
        assert_eq!(pair.token, "abc");
        assert_eq!(pair.secret, "s+cret");
    }

    #[test]
    fn test_parse_token_response_missing_secret() {
        let err = parse_token_response("oauth_token=abc").unwrap_err();
        assert!(matches!(err, PostcacheError::Credentials(_)));
    }

    #[test]
    fn test_extract_verifier_from_redirect_url() {
        let verifier = extract_verifier(
            "  https://example.com/callback?oauth_token=abc&oauth_verifier=xyz123#_=_\n",
        )
        .unwrap();
        assert_eq!(verifier, "xyz123");
    }

    #[test]
    fn test_extract_verifier_bare_value() {
        assert_eq!(extract_verifier("xyz123").unwrap(), "xyz123");
    }

    #[test]
    fn test_extract_verifier_rejects_empty_and_incomplete() {
        assert!(extract_verifier("   ").is_err());
        assert!(extract_verifier("https://example.com/callback?oauth_token=abc").is_err());
    }

    #[test]
    fn test_authorization_url() {
        let url = OAuthEndpoints::tumblr().authorization_url("req tok").unwrap();
        assert_eq!(url, "https://www.tumblr.com/oauth/authorize?oauth_token=req+tok");
    }
}
