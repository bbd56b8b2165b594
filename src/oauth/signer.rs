// OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
// Builds the signature base string and the `Authorization: OAuth ...` header value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::hmac;
use url::Url;

use crate::error::{PostcacheError, Result};

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Signs requests with consumer credentials and, once authorized, a token.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: Option<(&'a str, &'a str)>,
}

impl<'a> Signer<'a> {
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            token: None,
        }
    }

    /// Sign with a request or access token as well.
    pub fn with_token(mut self, token: &'a str, token_secret: &'a str) -> Self {
        self.token = Some((token, token_secret));
        self
    }

    /// Authorization header value with a fresh nonce and the current time.
    ///
    /// `params` are the query or form parameters of the request; `extra` are
    /// additional `oauth_*` protocol parameters such as `oauth_callback`.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, params, extra, &nonce, &timestamp)
    }

    /// Authorization header value for a fixed nonce and timestamp.
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer_key.into()),
            ("oauth_nonce".into(), nonce.into()),
            ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
            ("oauth_timestamp".into(), timestamp.into()),
            ("oauth_version".into(), OAUTH_VERSION.into()),
        ];
        if let Some((token, _)) = self.token {
            oauth.push(("oauth_token".into(), token.into()));
        }
        oauth.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let (base_url, url_params) = split_url(url)?;
        let all_params: Vec<(String, String)> = url_params
            .into_iter()
            .chain(params.iter().cloned())
            .chain(oauth.iter().cloned())
            .collect();

        let base = signature_base_string(method, &base_url, &all_params);
        let token_secret = self.token.map(|(_, secret)| secret).unwrap_or("");
        let signature = sign(&base, self.consumer_secret, token_secret);

        oauth.push(("oauth_signature".into(), signature));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Split a URL into its signing base (no query or fragment) and query pairs.
fn split_url(url: &str) -> Result<(String, Vec<(String, String)>)> {
    let parsed = Url::parse(url)
        .map_err(|e| PostcacheError::Other(format!("Invalid URL {}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PostcacheError::Other(format!("URL has no host: {}", url)))?;

    let mut base = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{}", port));
    }
    base.push_str(parsed.path());

    let query = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((base, query))
}

/// `METHOD&enc(url)&enc(normalized params)`.
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of `base` keyed by `enc(consumer_secret)&enc(token_secret)`.
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key_material = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key_material.as_bytes());
    let tag = hmac::sign(&key, base.as_bytes());
    STANDARD.encode(tag.as_ref())
}
