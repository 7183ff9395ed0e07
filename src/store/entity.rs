//! # Entities
//!
//! Schema-flexible documents and the declared schemas of their kinds.

use std::collections::{BTreeMap, BTreeSet};

use super::key::Key;
use super::value::Value;

/// A single document
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    kind: String,
    key: Option<Key>,
    properties: BTreeMap<String, Value>,
}

impl Entity {
    /// Create an unsaved entity of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            properties: BTreeMap::new(),
        }
    }

    /// Create an entity bound to an existing key
    pub fn with_key(key: Key) -> Self {
        Self {
            kind: key.kind().to_string(),
            key: Some(key),
            properties: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Key, if the entity has been saved or was created with one
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub(crate) fn set_key(&mut self, key: Key) {
        self.key = Some(key);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Builder-style [`Entity::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }
}

/// Declared schema of an entity kind
///
/// Order clauses may only name declared properties. Expando kinds accept
/// undeclared properties on write; fixed kinds reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSchema {
    kind: String,
    properties: BTreeSet<String>,
    expando: bool,
}

impl KindSchema {
    /// Fixed schema: only the declared properties may be written
    pub fn new<I, S>(kind: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            properties: properties.into_iter().map(Into::into).collect(),
            expando: false,
        }
    }

    /// Expando schema: declared properties plus any others on write
    pub fn expando<I, S>(kind: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expando: true,
            ..Self::new(kind, properties)
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_expando(&self) -> bool {
        self.expando
    }

    /// Whether the property is declared on this kind
    pub fn declares(&self, property: &str) -> bool {
        self.properties.contains(property)
    }

    /// Whether the property may be written
    pub fn accepts(&self, property: &str) -> bool {
        self.expando || self.declares(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }
}
