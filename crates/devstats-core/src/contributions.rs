use crate::{
    DeveloperStats, HostingPlatform, Member, Outcomes, PlatformError, Repository, Result,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Earliest of a set of instants.
pub fn earliest<I>(dates: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    dates
        .into_iter()
        .fold(None, |first, date| match first {
            Some(current) if current <= date => Some(current),
            _ => Some(date),
        })
}

/// Scan the organization for each member's first commit and first merged
/// pull request.
///
/// Always returns one entry per member, in member order. Lookups that fail for
/// a single repository or member are logged and count as "nothing found".
pub async fn resolve_developer_stats(
    platform: &dyn HostingPlatform,
    org: &str,
) -> Result<Vec<DeveloperStats>> {
    let members = platform.list_members(org).await?;
    let repos = platform.list_repositories(org).await?;
    info!(
        "Scanning {} repositories for {} members of {}",
        repos.len(),
        members.len(),
        org
    );

    let mut first_commits = Vec::with_capacity(members.len());
    for member in &members {
        first_commits.push(first_commit_for(platform, org, &repos, member).await);
    }

    let mut stats = Vec::with_capacity(members.len());
    for (member, first_commit_date) in members.iter().zip(first_commits) {
        let first_pr_date = first_pr_for(platform, org, member).await;
        let entry = DeveloperStats {
            login: member.login.clone(),
            first_commit_date,
            first_pr_date,
        };
        info!(
            "{}: first commit {}, first merged PR {}",
            entry.login,
            display_date(entry.first_commit_date),
            display_date(entry.first_pr_date)
        );
        stats.push(entry);
    }

    Ok(stats)
}

async fn first_commit_for(
    platform: &dyn HostingPlatform,
    org: &str,
    repos: &[Repository],
    member: &Member,
) -> Option<DateTime<Utc>> {
    let mut lookups: Outcomes<Option<DateTime<Utc>>, PlatformError> = Outcomes::new();
    for repo in repos {
        let result = platform
            .first_commit_date(org, &repo.name, &member.login)
            .await;
        lookups.push(format!("{}/{} ({})", org, repo.name, member.login), result);
    }

    lookups.log_failures("Commit lookup");
    debug!(
        "{}: {} repositories scanned, {} failed",
        member.login,
        lookups.len(),
        lookups.failure_count()
    );
    earliest(lookups.into_successes().flatten())
}

async fn first_pr_for(
    platform: &dyn HostingPlatform,
    org: &str,
    member: &Member,
) -> Option<DateTime<Utc>> {
    let mut search: Outcomes<Option<DateTime<Utc>>, PlatformError> = Outcomes::new();
    search.push(
        member.login.clone(),
        platform.first_merged_pr_date(org, &member.login).await,
    );
    search.log_failures("Merged PR search");
    search.into_successes().flatten().next()
}

fn display_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "none".to_string())
}
