//! # Cache Key Derivation
//!
//! Cache keys must be a pure function of the request parameters, not of
//! the order a client or a map happened to present them in. Parameters
//! are grouped by name in sorted order and the values of commutative
//! parameters are sorted. `order` values keep their relative order since
//! sort precedence changes the result.

/// Parameters whose value order is significant
const ORDER_SENSITIVE: &[&str] = &["order"];

/// Canonical ordering of `(name, value)` pairs
pub fn canonicalize<N, V>(params: &[(N, V)]) -> Vec<(String, String)>
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    let mut names: Vec<&str> = params.iter().map(|(n, _)| n.as_ref()).collect();
    names.sort_unstable();
    names.dedup();

    let mut canonical = Vec::with_capacity(params.len());
    for name in names {
        let mut values: Vec<&str> = params
            .iter()
            .filter(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v.as_ref())
            .collect();
        if !ORDER_SENSITIVE.contains(&name) {
            values.sort_unstable();
        }
        canonical.extend(values.into_iter().map(|v| (name.to_string(), v.to_string())));
    }
    canonical
}

/// Encode canonical pairs as a query string
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(n, v)| format!("{}={}", urlencoding::encode(n), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build a cache key from a prefix and request parameters
///
/// The result is `<prefix>?<canonical query string>`, or just the prefix
/// when there are no parameters.
pub fn build_cache_key<N, V>(prefix: &str, params: &[(N, V)]) -> String
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    let canonical = canonicalize(params);
    if canonical.is_empty() {
        return prefix.to_string();
    }
    format!("{}?{}", prefix, encode_pairs(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = [
            ("page", "2"),
            ("filter", "votes__gt__3"),
            ("order", "-votes"),
            ("filter", "name__bob"),
        ];
        let b = [
            ("filter", "name__bob"),
            ("order", "-votes"),
            ("filter", "votes__gt__3"),
            ("page", "2"),
        ];
        assert_eq!(build_cache_key("p", &a), build_cache_key("p", &b));
    }

    #[test]
    fn test_order_values_keep_relative_order() {
        let a = [("order", "a"), ("order", "b")];
        let b = [("order", "b"), ("order", "a")];
        assert_ne!(build_cache_key("p", &a), build_cache_key("p", &b));
    }

    #[test]
    fn test_values_are_encoded() {
        let key = build_cache_key("demo", &[("filter", "name__a b&c")]);
        assert_eq!(key, "demo?filter=name__a%20b%26c");
    }

    #[test]
    fn test_no_params_is_prefix() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(build_cache_key("demo", &empty), "demo");
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        assert_ne!(
            build_cache_key("p", &[("page", "1")]),
            build_cache_key("p", &[("page", "2")])
        );
        assert_ne!(
            build_cache_key("p", &[("page", "1")]),
            build_cache_key("q", &[("page", "1")])
        );
    }
}
