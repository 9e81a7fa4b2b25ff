//! Domain types for site pipeline replication.
//!
//! All types are serializable via serde so platform listings can be decoded
//! directly into them. Environment identifiers round-trip through their wire
//! names (`dev`, `test`, `live`, or a multidev label).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed site name on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteName(pub String);

impl SiteName {
    /// Construct a validated site name; rejects empty input and names with
    /// embedded whitespace.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidSiteName(s.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl fmt::Display for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SiteName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A deployment environment identifier.
///
/// The three pipeline stages are fixed; anything else the platform reports is
/// a multidev environment, carried so listings parse but excluded from
/// replication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvId {
    Dev,
    Test,
    Live,
    Multidev(String),
}

impl EnvId {
    /// The ordered pipeline stages, promotion order.
    pub fn pipeline() -> [EnvId; 3] {
        [EnvId::Dev, EnvId::Test, EnvId::Live]
    }

    /// True for dev/test/live, false for multidev.
    pub fn is_pipeline(&self) -> bool {
        !matches!(self, EnvId::Multidev(_))
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvId::Dev => write!(f, "dev"),
            EnvId::Test => write!(f, "test"),
            EnvId::Live => write!(f, "live"),
            EnvId::Multidev(label) => label.fmt(f),
        }
    }
}

impl From<String> for EnvId {
    fn from(s: String) -> Self {
        match s.as_str() {
            "dev" => EnvId::Dev,
            "test" => EnvId::Test,
            "live" => EnvId::Live,
            _ => EnvId::Multidev(s),
        }
    }
}

impl From<&str> for EnvId {
    fn from(s: &str) -> Self {
        EnvId::from(s.to_owned())
    }
}

impl From<EnvId> for String {
    fn from(e: EnvId) -> Self {
        e.to_string()
    }
}

/// A backup element: one of the three things a backup can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Code,
    Database,
    Files,
}

impl Element {
    /// Every element, in wire order.
    pub fn all() -> [Element; 3] {
        [Element::Code, Element::Database, Element::Files]
    }

    /// Elements replicated by the content driver (code travels through git).
    pub fn content() -> [Element; 2] {
        [Element::Database, Element::Files]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Code => write!(f, "code"),
            Element::Database => write!(f, "database"),
            Element::Files => write!(f, "files"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One of a site's deployment environments as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvId,
    pub initialized: bool,
    /// Commits present in dev but not yet deployed here. Only meaningful for
    /// initialized test/live; `None` everywhere else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployable_commits: Option<u32>,
}

/// A finished backup of one environment element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub env: EnvId,
    pub element: Element,
    pub finish_time: DateTime<Utc>,
    /// Download URL, resolvable on demand; absent until requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
