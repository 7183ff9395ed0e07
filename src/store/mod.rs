//! # Document Store
//!
//! The backing-store abstraction the framework runs on: schema-flexible
//! entities addressed by opaque keys, filtered and ordered scans with
//! resumable cursors, and all-or-nothing transactions.

pub mod backend;
pub mod entity;
pub mod errors;
pub mod key;
pub mod memory;
pub mod query;
pub mod value;

pub use backend::{transact, DocumentStore, Transaction, TransactionFn};
pub use entity::{Entity, KindSchema};
pub use errors::{StoreError, StoreResult};
pub use key::{Key, KeyId};
pub use memory::MemoryStore;
pub use query::{Cursor, Direction, Filter, FilterOp, Order, Query};
pub use value::{GeoPt, Value};
