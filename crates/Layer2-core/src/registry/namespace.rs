//! Namespace - dot-delimited identifiers for loadable units.

use kiln_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dot-delimited, globally unique identifier for a loadable unit
/// (class, stylesheet, template, remote-procedure stub).
///
/// Uniqueness is enforced only by registry membership - the namespace itself
/// is just a validated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Parse and validate. Segments must be non-empty, so leading, trailing
    /// and doubled dots are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.split('.').any(|segment| segment.is_empty()) {
            return Err(Error::InvalidNamespace(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-separated segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The last segment as a namespace of its own (remote-procedure stubs
    /// are keyed by short name).
    pub fn leaf_namespace(&self) -> Namespace {
        Namespace(self.leaf().to_string())
    }

    /// Everything but the last segment; `None` for a single-segment namespace.
    pub fn parent(&self) -> Option<Namespace> {
        let (parent, _) = self.0.rsplit_once('.')?;
        Some(Namespace(parent.to_string()))
    }

    /// URL path form: dots replaced by slashes.
    pub fn to_url_path(&self) -> String {
        self.0.replace('.', "/")
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Namespace {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
