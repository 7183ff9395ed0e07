//! # Store Queries
//!
//! Property-filtered, ordered scans over one entity kind. Filters are
//! ANDed. A list-valued property matches a filter when any element does.

use std::cmp::Ordering;

use super::entity::Entity;
use super::value::Value;

/// Filter comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl FilterOp {
    /// Operator symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Eq => "=",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Lte => ord != Ordering::Greater,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Gte => ord != Ordering::Less,
            FilterOp::Eq => ord == Ordering::Equal,
        }
    }
}

/// A single property predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub property: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(property: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    /// Entities without the property never match
    pub fn matches(&self, entity: &Entity) -> bool {
        match entity.get(&self.property) {
            None => false,
            Some(Value::List(items)) => items
                .iter()
                .any(|item| self.op.accepts(item.compare(&self.value))),
            Some(value) => self.op.accepts(value.compare(&self.value)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A single order clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    /// Parse `prop` (ascending) or `-prop` (descending)
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(property) => Self {
                property: property.to_string(),
                direction: Direction::Descending,
            },
            None => Self {
                property: raw.to_string(),
                direction: Direction::Ascending,
            },
        }
    }
}

/// Opaque resumable scan position issued by a store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A scan over one kind
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: String,
    filters: Vec<Filter>,
    orders: Vec<Order>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Add a filter (ANDed with existing ones)
    pub fn filter(mut self, property: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(property, op, value));
        self
    }

    /// Add an order clause; `-prop` sorts descending
    pub fn order(mut self, clause: &str) -> Self {
        self.orders.push(Order::parse(clause));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Whether the entity satisfies every filter
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind && self.filters.iter().all(|f| f.matches(entity))
    }

    /// Compare two entities by the order clauses
    ///
    /// Missing properties sort as null. Ties fall through to the next clause.
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        for order in &self.orders {
            let av = a.get(&order.property).unwrap_or(&Value::Null);
            let bv = b.get(&order.property).unwrap_or(&Value::Null);
            let ord = match order.direction {
                Direction::Ascending => av.compare(bv),
                Direction::Descending => bv.compare(av),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
