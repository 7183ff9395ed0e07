//! # Memoization
//!
//! Caches the result of a computation under a key derived from an
//! explicit namespace and argument list. Callers name the inputs that
//! identify a result; nothing is inferred from the call site.
//!
//! Results are stored wrapped as `{"v": <value>}` so a computation that
//! legitimately returns `null` is still distinguishable from a miss.

use std::fmt::Write as _;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::backend::Cache;
use super::keys::canonicalize;

const WRAPPER_FIELD: &str = "v";

/// Memoization options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoOptions {
    /// Entry lifetime; `Some(Duration::ZERO)` never expires, `None` disables writes
    pub ttl: Option<Duration>,
    /// Recompute and overwrite even on a hit
    pub refresh: bool,
}

impl MemoOptions {
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            refresh: false,
        }
    }

    /// Always compute, never store
    pub fn disabled() -> Self {
        Self {
            ttl: None,
            refresh: true,
        }
    }

    pub fn refreshing(mut self) -> Self {
        self.refresh = true;
        self
    }
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self::ttl(Duration::ZERO)
    }
}

/// SHA-256 hex key for a namespace and its arguments
pub fn memo_key<N, V>(namespace: &str, args: &[(N, V)]) -> String
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    let rendered: Vec<String> = canonicalize(args)
        .into_iter()
        .map(|(n, v)| format!("{}={}", n, v))
        .collect();
    let source = format!("{}({})", namespace, rendered.join(","));

    let digest = Sha256::digest(source.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Return the cached result for `namespace(args)` or compute and store it
///
/// Cache failures degrade to computing; errors from `compute` are returned
/// unchanged and never cached.
pub fn memoize<T, E, N, V, F>(
    cache: &dyn Cache,
    namespace: &str,
    args: &[(N, V)],
    options: &MemoOptions,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    N: AsRef<str>,
    V: AsRef<str>,
    F: FnOnce() -> Result<T, E>,
{
    let key = memo_key(namespace, args);

    if !options.refresh {
        match cache.get(&key) {
            Ok(Some(Value::Object(mut wrapped))) => {
                if let Some(inner) = wrapped.remove(WRAPPER_FIELD) {
                    if let Ok(value) = serde_json::from_value(inner) {
                        debug!(namespace, key = %key, "memo hit");
                        return Ok(value);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!(namespace, error = %e, "memo cache read failed"),
        }
        debug!(namespace, key = %key, "memo miss");
    }

    let output = compute()?;

    if let Some(ttl) = options.ttl {
        match serde_json::to_value(&output) {
            Ok(value) => {
                let mut wrapped = Map::new();
                wrapped.insert(WRAPPER_FIELD.to_string(), value);
                if let Err(e) = cache.set(&key, Value::Object(wrapped), ttl) {
                    warn!(namespace, error = %e, "memo cache write failed");
                }
            }
            Err(e) => warn!(namespace, error = %e, "memo result not serializable"),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[test]
    fn test_key_is_stable_and_argument_sensitive() {
        let a = memo_key("time", &[("tz", "UTC"), ("fmt", "iso")]);
        let b = memo_key("time", &[("fmt", "iso"), ("tz", "UTC")]);
        let c = memo_key("time", &[("tz", "CET"), ("fmt", "iso")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_second_call_is_cached() {
        let cache = MemoryCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, Infallible>(calls.get())
        };
        let no_args: [(&str, &str); 0] = [];

        let first = memoize(&cache, "n", &no_args, &MemoOptions::default(), compute).unwrap();
        let second = memoize(&cache, "n", &no_args, &MemoOptions::default(), compute).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_null_result_is_cached() {
        let cache = MemoryCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<Option<u32>, Infallible>(None)
        };
        let args = [("q", "x")];
        assert_eq!(memoize(&cache, "none", &args, &MemoOptions::default(), compute).unwrap(), None);
        assert_eq!(memoize(&cache, "none", &args, &MemoOptions::default(), compute).unwrap(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_refresh_recomputes() {
        let cache = MemoryCache::new();
        let args = [("a", "1")];
        memoize(&cache, "r", &args, &MemoOptions::default(), || Ok::<_, Infallible>(1)).unwrap();
        let refreshed = memoize(&cache, "r", &args, &MemoOptions::default().refreshing(), || {
            Ok::<_, Infallible>(2)
        })
        .unwrap();
        assert_eq!(refreshed, 2);
        let cached = memoize(&cache, "r", &args, &MemoOptions::default(), || Ok::<_, Infallible>(3)).unwrap();
        assert_eq!(cached, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = MemoryCache::new();
        let args = [("a", "1")];
        let failed: Result<u32, &str> = memoize(&cache, "e", &args, &MemoOptions::default(), || Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unavailable_cache_still_computes() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);
        let args = [("a", "1")];
        let value = memoize(&cache, "u", &args, &MemoOptions::default(), || Ok::<_, Infallible>(7)).unwrap();
        assert_eq!(value, 7);
    }
}
