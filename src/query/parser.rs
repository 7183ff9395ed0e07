//! # Query Parameter Parser
//!
//! Parses raw query strings into repeated `(name, value)` pairs and
//! filter expressions of the form `<field><op><value>`.

use crate::store::{Filter, FilterOp};

use super::coerce::coerce;
use super::errors::{QueryError, QueryResult};

/// Repeatable filter parameter
pub const FILTER_PARAM: &str = "filter";
/// Repeatable order parameter
pub const ORDER_PARAM: &str = "order";
/// 1-based page number
pub const PAGE_PARAM: &str = "page";
/// Items per page
pub const PAGE_SIZE_PARAM: &str = "page_size";
/// Opaque resume position
pub const CURSOR_PARAM: &str = "cursor";
/// Single-entity lookup on the collection path
pub const KEY_PARAM: &str = "key";

/// Operator tokens, most specific first so `__` never shadows `__lt__`
const OPERATORS: &[(&str, FilterOp)] = &[
    ("__lte__", FilterOp::Lte),
    ("__gte__", FilterOp::Gte),
    ("__lt__", FilterOp::Lt),
    ("__gt__", FilterOp::Gt),
    ("__", FilterOp::Eq),
];

/// Request parameters in arrival order, names may repeat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Parse an `a=1&b=2` query string; `+` decodes to a space
    pub fn parse(query_string: &str) -> Self {
        let pairs = query_string
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(name), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    /// First value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a parameter, in arrival order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Parse a single filter expression
///
/// The first operator token found splits field from value. The field must
/// be non-empty, and an equality value may not contain another `__`.
pub fn parse_filter(raw: &str) -> QueryResult<Filter> {
    let malformed = || QueryError::MalformedFilter(raw.to_string());

    let (field, op, value) = OPERATORS
        .iter()
        .find_map(|(token, op)| {
            raw.split_once(*token).map(|(field, value)| (field, *op, value))
        })
        .ok_or_else(malformed)?;

    if field.is_empty() || (op == FilterOp::Eq && value.contains("__")) {
        return Err(malformed());
    }
    Ok(Filter::new(field, op, coerce(value)))
}
