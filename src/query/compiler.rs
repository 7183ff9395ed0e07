//! # Query Compiler
//!
//! Turns `filter`/`order` request parameters into a store query for one
//! kind. The cache key and next-page URL are derived from the same
//! parameters in canonical order, so requests that differ only in
//! parameter arrival order compile, cache and link identically.

use crate::cache::{build_cache_key, canonicalize, encode_pairs};
use crate::store::{Cursor, KindSchema, Order, Query};

use super::errors::{QueryError, QueryResult};
use super::parser::{parse_filter, QueryParams, CURSOR_PARAM, FILTER_PARAM, ORDER_PARAM, PAGE_SIZE_PARAM};

/// Compiles request parameters against a kind's declared schema
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    schema: &'a KindSchema,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a KindSchema) -> Self {
        Self { schema }
    }

    /// Build the query: every filter ANDed, orders applied in the given order
    ///
    /// Filters are applied in sorted order. Orders may only name declared
    /// properties.
    pub fn compile(&self, params: &QueryParams) -> QueryResult<Query> {
        let mut query = Query::new(self.schema.kind());

        let mut filters = params.get_all(FILTER_PARAM);
        filters.sort_unstable();
        for raw in filters {
            let filter = parse_filter(raw)?;
            query = query.filter(filter.property, filter.op, filter.value);
        }

        for raw in params.get_all(ORDER_PARAM) {
            let order = Order::parse(raw);
            if !self.schema.declares(&order.property) {
                return Err(QueryError::InvalidOrder(raw.to_string()));
            }
            query = query.order(raw);
        }

        Ok(query)
    }

    /// Cache key over every request parameter
    pub fn cache_key(prefix: &str, params: &QueryParams) -> String {
        build_cache_key(prefix, params.pairs())
    }

    /// Relative URL resuming the scan at `cursor` with the same filters and orders
    pub fn next_page_url(path: &str, page_size: usize, cursor: &Cursor, params: &QueryParams) -> String {
        let carried: Vec<(&str, &str)> = params
            .pairs()
            .iter()
            .filter(|(n, _)| n == FILTER_PARAM || n == ORDER_PARAM)
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();

        let mut url = format!(
            "{}?{}={}&{}={}",
            path,
            PAGE_SIZE_PARAM,
            page_size,
            CURSOR_PARAM,
            urlencoding::encode(cursor.as_str())
        );
        let canonical = canonicalize(&carried);
        if !canonical.is_empty() {
            url.push('&');
            url.push_str(&encode_pairs(&canonical));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Direction, Filter, FilterOp};

    fn schema() -> KindSchema {
        KindSchema::expando("Post", ["title", "votes", "created"])
    }

    #[test]
    fn test_compile_filters_and_orders() {
        let schema = schema();
        let params = QueryParams::parse("filter=votes__gt__3&filter=title__hello&order=-votes&order=title");
        let query = QueryCompiler::new(&schema).compile(&params).unwrap();

        assert_eq!(query.kind(), "Post");
        assert_eq!(
            query.filters(),
            &[
                Filter::new("title", FilterOp::Eq, "hello"),
                Filter::new("votes", FilterOp::Gt, 3i64),
            ]
        );
        assert_eq!(query.orders().len(), 2);
        assert_eq!(query.orders()[0].property, "votes");
        assert_eq!(query.orders()[0].direction, Direction::Descending);
        assert_eq!(query.orders()[1].property, "title");
    }

    #[test]
    fn test_filter_order_is_canonical() {
        let schema = schema();
        let compiler = QueryCompiler::new(&schema);
        let a = compiler
            .compile(&QueryParams::parse("filter=votes__gt__3&filter=title__x"))
            .unwrap();
        let b = compiler
            .compile(&QueryParams::parse("filter=title__x&filter=votes__gt__3"))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_undeclared_order_rejected() {
        let schema = schema();
        let params = QueryParams::parse("order=-secret");
        assert_eq!(
            QueryCompiler::new(&schema).compile(&params),
            Err(QueryError::InvalidOrder("-secret".to_string()))
        );
    }

    #[test]
    fn test_malformed_filter_rejected() {
        let schema = schema();
        let params = QueryParams::parse("filter=votes");
        assert!(matches!(
            QueryCompiler::new(&schema).compile(&params),
            Err(QueryError::MalformedFilter(_))
        ));
    }

    #[test]
    fn test_cache_key_ignores_arrival_order() {
        let a = QueryParams::parse("page=2&filter=b__1&filter=a__2&order=-votes");
        let b = QueryParams::parse("order=-votes&filter=a__2&page=2&filter=b__1");
        assert_eq!(QueryCompiler::cache_key("Posts", &a), QueryCompiler::cache_key("Posts", &b));
    }

    #[test]
    fn test_next_page_url() {
        let params = QueryParams::parse("order=-votes&page_size=5&filter=title__a b&cursor=old");
        let url = QueryCompiler::next_page_url("/posts", 5, &Cursor::new("cG9zOjU="), &params);
        assert_eq!(
            url,
            "/posts?page_size=5&cursor=cG9zOjU%3D&filter=title__a%20b&order=-votes"
        );
    }
}
