// Cached, authenticated fetching.
// Serves API responses from the data cache and falls back to signed requests on a miss.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock, ParamValue, normalize};
use crate::error::Result;
use crate::oauth::TokenSet;

/// Default retention for API responses, in days.
pub const DEFAULT_DATA_TTL_DAYS: i64 = 1;
/// Default retention for credentials, in days.
pub const DEFAULT_CREDS_TTL_DAYS: i64 = 1;

/// Obtains fresh credentials for a named service.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire(&self, service: &str) -> Result<TokenSet>;
}

/// Performs an authenticated GET and returns the raw response body.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get_text(
        &self,
        url: &str,
        params: &[(String, ParamValue)],
        tokens: &TokenSet,
    ) -> Result<String>;
}

/// Request orchestrator over a data cache and a credential cache.
///
/// Both stores are owned here and written through on every miss. Calls run
/// one at a time; nothing is retried.
pub struct Fetcher {
    data: CacheStore,
    creds: CacheStore,
    provider: Box<dyn CredentialProvider>,
    http: Box<dyn HttpFetcher>,
    clock: Arc<dyn Clock>,
    creds_ttl_days: i64,
}

impl Fetcher {
    pub fn new(
        data: CacheStore,
        creds: CacheStore,
        provider: Box<dyn CredentialProvider>,
        http: Box<dyn HttpFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            data,
            creds,
            provider,
            http,
            clock,
            creds_ttl_days: DEFAULT_CREDS_TTL_DAYS,
        }
    }

    /// Retention applied to newly acquired credentials.
    pub fn with_creds_ttl_days(mut self, days: i64) -> Self {
        self.creds_ttl_days = days;
        self
    }

    /// Cached credentials for `service`, acquiring and storing new ones on a miss.
    pub async fn ensure_credentials(&mut self, service: &str) -> Result<TokenSet> {
        let now = self.clock.now();
        if let Some(tokens) = self.creds.get_as::<TokenSet>(service, now)? {
            debug!(service, "loading credentials from cache");
            return Ok(tokens);
        }

        let tokens = self.provider.acquire(service).await?;
        self.creds
            .set_as(service, &tokens, self.creds_ttl_days, self.clock.now())?;
        info!(service, ttl_days = self.creds_ttl_days, "stored fresh credentials");
        Ok(tokens)
    }

    /// Response for `url` with `params`, from cache when fresh.
    ///
    /// On a miss the body is fetched with `service` credentials, parsed as
    /// JSON, and cached for `ttl_days`. Failures are returned, never cached.
    pub async fn fetch(
        &mut self,
        url: &str,
        params: &[(String, ParamValue)],
        service: &str,
        ttl_days: i64,
    ) -> Result<Value> {
        let identifier = normalize(url, params);
        if let Some(value) = self.data.get(&identifier, self.clock.now()) {
            debug!(identifier = %identifier, "loading from data cache");
            return Ok(value.clone());
        }

        info!(url, "fetching new data");
        let tokens = self.ensure_credentials(service).await?;
        let body = self.http.get_text(url, params, &tokens).await?;
        let parsed: Value = serde_json::from_str(&body)?;

        self.data
            .set(&identifier, parsed.clone(), ttl_days, self.clock.now())?;
        Ok(parsed)
    }

    /// Drop the cached response for `url` with `params`.
    pub fn invalidate(&mut self, url: &str, params: &[(String, ParamValue)]) -> Result<bool> {
        let identifier = normalize(url, params);
        let removed = self.data.remove(&identifier)?;
        if removed {
            debug!(identifier = %identifier, "invalidated cached response");
        }
        Ok(removed)
    }

    /// Drop cached credentials for `service`.
    pub fn forget_credentials(&mut self, service: &str) -> Result<bool> {
        self.creds.remove(service)
    }

    pub fn data_cache(&self) -> &CacheStore {
        &self.data
    }

    pub fn credential_cache(&self) -> &CacheStore {
        &self.creds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FixedClock, params};
    use crate::error::PostcacheError;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const URL: &str = "https://api.tumblr.com/v2/blog/example.tumblr.com/posts/";

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn tokens() -> TokenSet {
        TokenSet {
            client_key: "ck".into(),
            client_secret: "cs".into(),
            resource_owner_key: "rk".into(),
            resource_owner_secret: "rs".into(),
            verifier: Some("v".into()),
        }
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl CredentialProvider for CountingProvider {
        async fn acquire(&self, _service: &str) -> Result<TokenSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PostcacheError::Credentials("user declined".into()));
            }
            Ok(tokens())
        }
    }

    struct ScriptedHttp {
        calls: Arc<AtomicUsize>,
        responses: Mutex<Vec<Result<String>>>,
    }

    #[async_trait]
    impl HttpFetcher for ScriptedHttp {
        async fn get_text(
            &self,
            _url: &str,
            _params: &[(String, ParamValue)],
            tokens: &TokenSet,
        ) -> Result<String> {
            assert_eq!(tokens.resource_owner_key, "rk");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    struct Harness {
        fetcher: Fetcher,
        clock: Arc<FixedClock>,
        auth_calls: Arc<AtomicUsize>,
        http_calls: Arc<AtomicUsize>,
        dir: TempDir,
    }

    fn harness(responses: Vec<Result<String>>, fail_auth: bool) -> Harness {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(FixedClock::new(t0()));
        let auth_calls = Arc::new(AtomicUsize::new(0));
        let http_calls = Arc::new(AtomicUsize::new(0));

        let fetcher = Fetcher::new(
            CacheStore::open(dir.path().join("cache_contents.json")).unwrap(),
            CacheStore::open(dir.path().join("creds.json")).unwrap(),
            Box::new(CountingProvider {
                calls: auth_calls.clone(),
                fail: fail_auth,
            }),
            Box::new(ScriptedHttp {
                calls: http_calls.clone(),
                responses: Mutex::new(responses),
            }),
            clock.clone(),
        );

        Harness {
            fetcher,
            clock,
            auth_calls,
            http_calls,
            dir,
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let mut h = harness(vec![Ok(r#"{"response": {"posts": []}}"#.into())], false);
        let p = params([("type", "text"), ("filter", "text")]);

        let first = h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap();
        assert_eq!(first, json!({"response": {"posts": []}}));

        // Same request with parameters in another order is a cache hit.
        let reordered = params([("filter", "text"), ("type", "text")]);
        let second = h.fetcher.fetch(URL, &reordered, "Tumblr", 1).await.unwrap();
        assert_eq!(second, first);

        assert_eq!(h.http_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credentials_acquired_once_within_ttl() {
        let mut h = harness(vec![], false);

        let first = h.fetcher.ensure_credentials("Tumblr").await.unwrap();
        assert_eq!(first, tokens());
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 1);

        let on_disk = CacheStore::load(&h.dir.path().join("creds.json")).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert!(on_disk.contains_key("TUMBLR"));

        h.clock.advance(TimeDelta::hours(30));
        let second = h.fetcher.ensure_credentials("tumblr").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_credentials_are_reacquired() {
        let mut h = harness(vec![], false);
        h.fetcher.ensure_credentials("Tumblr").await.unwrap();

        h.clock.advance(TimeDelta::days(2));
        h.fetcher.ensure_credentials("Tumblr").await.unwrap();
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_data_is_refetched() {
        let mut h = harness(
            vec![Ok(r#"{"n": 1}"#.into()), Ok(r#"{"n": 2}"#.into())],
            false,
        );
        let p = params([("type", "photo")]);

        assert_eq!(h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap(), json!({"n": 1}));

        h.clock.advance(TimeDelta::days(2));
        assert_eq!(h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap(), json!({"n": 2}));
        assert_eq!(h.http_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut h = harness(
            vec![Ok(r#"{"n": 1}"#.into()), Ok(r#"{"n": 2}"#.into())],
            false,
        );
        let p = params([("type", "photo")]);

        h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap();
        assert!(h.fetcher.invalidate(URL, &p).unwrap());
        assert!(!h.fetcher.invalidate(URL, &p).unwrap());

        assert_eq!(h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap(), json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_http_failure_is_not_cached() {
        let mut h = harness(
            vec![Err(PostcacheError::RateLimited), Ok(r#"{"ok": true}"#.into())],
            false,
        );
        let p = params([("type", "text")]);

        let err = h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap_err();
        assert!(matches!(err, PostcacheError::RateLimited));
        assert!(h.fetcher.data_cache().is_empty());

        let ok = h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap();
        assert_eq!(ok, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_cached() {
        let mut h = harness(vec![Ok("<html>oops</html>".into())], false);
        let p = params([("type", "text")]);

        let err = h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap_err();
        assert!(matches!(err, PostcacheError::Json(_)));
        assert!(h.fetcher.data_cache().is_empty());
    }

    #[tokio::test]
    async fn test_credential_failure_aborts_fetch() {
        let mut h = harness(vec![Ok("{}".into())], true);
        let p = params([("type", "text")]);

        let err = h.fetcher.fetch(URL, &p, "Tumblr", 1).await.unwrap_err();
        assert!(matches!(err, PostcacheError::Credentials(_)));
        assert_eq!(h.http_calls.load(Ordering::SeqCst), 0);
        assert!(h.fetcher.credential_cache().is_empty());
    }

    #[tokio::test]
    async fn test_forget_credentials_triggers_new_acquisition() {
        let mut h = harness(vec![], false);
        h.fetcher.ensure_credentials("Tumblr").await.unwrap();

        assert!(h.fetcher.forget_credentials("TUMBLR").unwrap());
        h.fetcher.ensure_credentials("Tumblr").await.unwrap();
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_creds_ttl_is_configurable() {
        let mut h = harness(vec![], false);
        h.fetcher = h.fetcher.with_creds_ttl_days(7);

        h.fetcher.ensure_credentials("Tumblr").await.unwrap();
        h.clock.advance(TimeDelta::days(5));
        h.fetcher.ensure_credentials("Tumblr").await.unwrap();
        assert_eq!(h.auth_calls.load(Ordering::SeqCst), 1);
    }
}
