use crate::{
    CatalogResult, CatalogUser, JoinRecord, Member, PlatformResult, RateLimit, Repository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only view of the source-control hosting platform.
#[async_trait]
pub trait HostingPlatform: Send + Sync {
    /// Current API quota for the authenticated token.
    async fn rate_limit(&self) -> PlatformResult<RateLimit>;

    async fn list_members(&self, org: &str) -> PlatformResult<Vec<Member>>;

    async fn list_repositories(&self, org: &str) -> PlatformResult<Vec<Repository>>;

    /// Author date of the oldest commit by `author` in `org/repo`, if any.
    async fn first_commit_date(
        &self,
        org: &str,
        repo: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>>;

    /// Creation date of the oldest merged pull request by `author` in `org`.
    async fn first_merged_pr_date(
        &self,
        org: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>>;

    /// "Member added" events from the enterprise audit log.
    async fn member_added_events(&self, enterprise: &str) -> PlatformResult<Vec<JoinRecord>>;
}

/// Entity storage of the software catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_entities(&self, blueprint: &str) -> CatalogResult<Vec<CatalogUser>>;

    /// Create or replace one entity, keyed by its identifier.
    async fn upsert_entity(&self, blueprint: &str, entity: &CatalogUser) -> CatalogResult<()>;
}
