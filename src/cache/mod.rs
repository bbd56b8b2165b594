// Cache module for TTL-based local persistence.
// Stores API responses and OAuth credentials in JSON files keyed by normalized identifiers.

pub mod identifier;
pub mod paths;
pub mod store;
pub mod ttl;

pub use identifier::{ParamValue, Params, normalize, params, query_pairs};
pub use paths::{cache_dir, creds_cache_path, data_cache_path};
pub use store::{CacheEntry, CacheStore, Entries};
pub use ttl::{Clock, FixedClock, LocalClock, is_expired};
