//! Newtype wrappers for the string identifiers used in page references.
//!
//! These types provide compile-time type safety to prevent mixing up
//! a domain with a book path, or an element id with either.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// The domain a book is published under (e.g. `docs.example.com`).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(Arc<str>);

impl DomainName {
    /// Creates a new DomainName from a string
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DomainName {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for DomainName {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The path of a book within its domain, always beginning with a slash.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookPath(Arc<str>);

impl BookPath {
    /// Creates a new BookPath from a string
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BookPath {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for BookPath {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for BookPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The id of an element, unique within the page that declares it.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Arc<str>);

impl ElementId {
    /// Creates a new ElementId from a string
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
