use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::properties::{PropertyMap, Relations};

/// A person in the hosting platform's organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub login: String,
}

impl Member {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

/// A repository within the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One "member added" audit-log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    /// Login of the added member, matched against catalog identifiers
    pub user: String,
    pub user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Derived contribution facts for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperStats {
    pub login: String,
    pub first_commit_date: Option<DateTime<Utc>>,
    pub first_pr_date: Option<DateTime<Utc>>,
}

impl DeveloperStats {
    pub fn has_facts(&self) -> bool {
        self.first_commit_date.is_some() || self.first_pr_date.is_some()
    }
}

/// A catalog entity of the user blueprint.
///
/// Owned by the catalog service; this crate only reads a snapshot and writes
/// back a superset of its properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogUser {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default)]
    pub relations: Relations,
}

/// Quota snapshot reported by the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub used: u64,
    /// Epoch seconds at which the quota window resets
    pub reset: u64,
}

impl RateLimit {
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reset)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}
