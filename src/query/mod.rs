//! # Query Compilation
//!
//! Request parameters to store queries: filter parsing with value
//! coercion, schema-checked ordering, and the canonical cache key and
//! next-page URL derived from the same parameter set.

pub mod coerce;
pub mod compiler;
pub mod errors;
pub mod parser;

pub use coerce::coerce;
pub use compiler::QueryCompiler;
pub use errors::{QueryError, QueryResult};
pub use parser::{
    parse_filter, QueryParams, CURSOR_PARAM, FILTER_PARAM, KEY_PARAM, ORDER_PARAM, PAGE_PARAM,
    PAGE_SIZE_PARAM,
};
