// GitHub REST request/response types

use chrono::{DateTime, TimeZone, Utc};
use devstats_core::{JoinRecord, PlatformError, PlatformResult, RateLimit};
use reqwest::header::HeaderMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct MemberItem {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryItem {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitItem {
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitDetail {
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Signature {
    pub date: Option<DateTime<Utc>>,
}

impl CommitItem {
    /// Author date, falling back to the committer date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .and_then(|s| s.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|s| s.date))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub created_at: DateTime<Utc>,
}

/// The audit log reports times as epoch milliseconds; older payloads and
/// some exports use ISO-8601 strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AuditTimestamp {
    Millis(i64),
    Text(String),
}

impl AuditTimestamp {
    pub fn to_datetime(&self) -> PlatformResult<DateTime<Utc>> {
        match self {
            AuditTimestamp::Millis(ms) => {
                Utc.timestamp_millis_opt(*ms)
                    .single()
                    .ok_or_else(|| PlatformError::Timestamp {
                        value: ms.to_string(),
                    })
            }
            AuditTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| PlatformError::Timestamp {
                    value: text.clone(),
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditEvent {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<AuditTimestamp>,
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<AuditTimestamp>,
}

impl AuditEvent {
    /// `None` for events that name no user; they cannot be joined to the
    /// catalog.
    pub fn into_join_record(self) -> PlatformResult<Option<JoinRecord>> {
        let Some(user) = self.user else {
            return Ok(None);
        };
        let stamp = self
            .created_at
            .or(self.timestamp)
            .ok_or_else(|| PlatformError::Timestamp {
                value: format!("<missing for {}>", user),
            })?;
        Ok(Some(JoinRecord {
            user,
            user_id: self.user_id,
            created_at: stamp.to_datetime()?,
        }))
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Quota from the `x-ratelimit-*` headers; absent values read as zero.
pub(crate) fn rate_limit_from_headers(headers: &HeaderMap) -> RateLimit {
    RateLimit {
        limit: header_u64(headers, "x-ratelimit-limit"),
        remaining: header_u64(headers, "x-ratelimit-remaining"),
        used: header_u64(headers, "x-ratelimit-used"),
        reset: header_u64(headers, "x-ratelimit-reset"),
    }
}
