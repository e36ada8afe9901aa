//! The two reporting commands and the dispatcher that runs them.

use crate::{
    check_rate_limit, earliest_join_by_user, resolve_developer_stats, resolve_join_dates,
    Catalog, CatalogUser, CatalogWriter, DeveloperStats, HostingPlatform, JoinRecord,
    PropertyMap, PropertyValue, Result, WriteReport,
};
use std::collections::HashMap;
use tracing::info;

pub const JOIN_DATE_PROPERTY: &str = "join_date";
pub const FIRST_COMMIT_PROPERTY: &str = "first_commit";
pub const FIRST_PR_PROPERTY: &str = "first_pr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve when each member was added to the organization
    MemberJoinDates { enterprise: String },
    /// Resolve each member's first commit and first merged pull request
    DeveloperStats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::MemberJoinDates { .. } => "get-member-join-dates",
            Command::DeveloperStats => "get-developer-stats",
        }
    }
}

/// Receives resolved facts before anything is written to the catalog.
pub trait StatsReporter: Send + Sync {
    fn join_dates_resolved(&self, _records: &[JoinRecord]) {}

    fn developer_stats_resolved(&self, _stats: &[DeveloperStats]) {}
}

impl StatsReporter for () {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    JoinDates {
        records: Vec<JoinRecord>,
        write: WriteReport,
    },
    DeveloperStats {
        stats: Vec<DeveloperStats>,
        write: WriteReport,
    },
}

impl CommandReport {
    pub fn write(&self) -> &WriteReport {
        match self {
            CommandReport::JoinDates { write, .. } => write,
            CommandReport::DeveloperStats { write, .. } => write,
        }
    }
}

pub struct Dispatcher<'a> {
    platform: &'a dyn HostingPlatform,
    catalog: &'a dyn Catalog,
    org: &'a str,
    blueprint: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        platform: &'a dyn HostingPlatform,
        catalog: &'a dyn Catalog,
        org: &'a str,
        blueprint: &'a str,
    ) -> Self {
        Self {
            platform,
            catalog,
            org,
            blueprint,
        }
    }

    /// Check the rate limit once, then run `command` end to end.
    pub async fn run(
        &self,
        command: &Command,
        reporter: &dyn StatsReporter,
    ) -> Result<CommandReport> {
        info!("Running {} for {}", command.name(), self.org);
        check_rate_limit(self.platform).await?;

        match command {
            Command::MemberJoinDates { enterprise } => {
                self.member_join_dates(enterprise, reporter).await
            }
            Command::DeveloperStats => self.developer_stats(reporter).await,
        }
    }

    async fn member_join_dates(
        &self,
        enterprise: &str,
        reporter: &dyn StatsReporter,
    ) -> Result<CommandReport> {
        let users = self.catalog_users().await?;
        let records = resolve_join_dates(self.platform, enterprise).await?;
        reporter.join_dates_resolved(&records);

        let by_user = earliest_join_by_user(&records);
        let updates = users.iter().map(|user| {
            let fragment = by_user.get(user.identifier.as_str()).map(|record| {
                PropertyMap::from([(
                    JOIN_DATE_PROPERTY.to_string(),
                    PropertyValue::from(record.created_at),
                )])
            });
            (user, fragment)
        });

        let write = self.writer().write_all(updates).await;
        Ok(CommandReport::JoinDates { records, write })
    }

    async fn developer_stats(&self, reporter: &dyn StatsReporter) -> Result<CommandReport> {
        let users = self.catalog_users().await?;
        let stats = resolve_developer_stats(self.platform, self.org).await?;
        reporter.developer_stats_resolved(&stats);

        let by_login: HashMap<&str, &DeveloperStats> =
            stats.iter().map(|s| (s.login.as_str(), s)).collect();
        let updates = users.iter().map(|user| {
            let fragment = by_login
                .get(user.identifier.as_str())
                .and_then(|s| stats_fragment(s));
            (user, fragment)
        });

        let write = self.writer().write_all(updates).await;
        Ok(CommandReport::DeveloperStats { stats, write })
    }

    async fn catalog_users(&self) -> Result<Vec<CatalogUser>> {
        let users = self.catalog.get_entities(self.blueprint).await?;
        info!(
            "Loaded {} catalog entities from blueprint {}",
            users.len(),
            self.blueprint
        );
        Ok(users)
    }

    fn writer(&self) -> CatalogWriter<'a> {
        CatalogWriter::new(self.catalog, self.blueprint)
    }
}

/// Properties for whichever dates are known; `None` when neither is.
pub fn stats_fragment(stats: &DeveloperStats) -> Option<PropertyMap> {
    if !stats.has_facts() {
        return None;
    }
    let mut fragment = PropertyMap::new();
    if let Some(date) = stats.first_commit_date {
        fragment.insert(FIRST_COMMIT_PROPERTY.to_string(), date.into());
    }
    if let Some(date) = stats.first_pr_date {
        fragment.insert(FIRST_PR_PROPERTY.to_string(), date.into());
    }
    Some(fragment)
}
