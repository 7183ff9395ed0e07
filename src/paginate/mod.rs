//! # Pagination
//!
//! Offset pagination over anything that can report its size: in-memory
//! sequences or a store query's count. Invalid page requests resolve to
//! the nearest valid page instead of failing.

pub mod errors;
pub mod paginator;

pub use errors::{PageError, PageResult};
pub use paginator::{ItemCount, Page, PageLink, Paginator, StoreCount};
