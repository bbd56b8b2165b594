// OAuth 1.0a support.
// Token types, request signing, and the interactive browser flow that obtains tokens.

pub mod flow;
pub mod signer;

use serde::{Deserialize, Serialize};

pub use flow::{InteractiveOAuth, OAuthEndpoints};
pub use signer::Signer;

/// Application (consumer) credentials issued by the API provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerCredentials {
    pub key: String,
    pub secret: String,
}

impl ConsumerCredentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Everything needed to sign requests on behalf of an authorized user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub client_key: String,
    pub client_secret: String,
    pub resource_owner_key: String,
    pub resource_owner_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
}

impl TokenSet {
    /// Signer for requests made with these tokens.
    pub fn signer(&self) -> Signer<'_> {
        Signer::new(&self.client_key, &self.client_secret)
            .with_token(&self.resource_owner_key, &self.resource_owner_secret)
    }
}
