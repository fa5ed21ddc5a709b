use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ClassifiedMessage;

const ID_PREFIX: &str = "pkg-";

/// Unique package identifier, rendered and persisted as `pkg-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PackageId(u64);

impl PackageId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn seq(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPackageId(pub String);

impl fmt::Display for InvalidPackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid package id {:?}", self.0)
    }
}

impl std::error::Error for InvalidPackageId {}

impl FromStr for PackageId {
    type Err = InvalidPackageId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(ID_PREFIX)
            .and_then(|digits| digits.parse().ok())
            .map(Self)
            .ok_or_else(|| InvalidPackageId(s.to_string()))
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PackageId {
    type Error = InvalidPackageId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A named, ordered collection of messages bounded by Start/Complete signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub items: Vec<ClassifiedMessage>,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub complete: bool,
}

impl Package {
    pub fn open(id: PackageId, name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            name: name.into(),
            items: Vec::new(),
            created_at,
            complete: false,
        }
    }
}
