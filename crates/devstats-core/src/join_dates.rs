use crate::{HostingPlatform, JoinRecord, Result};
use std::collections::BTreeMap;
use tracing::info;

/// Fetch "member added" events for the enterprise.
pub async fn resolve_join_dates(
    platform: &dyn HostingPlatform,
    enterprise: &str,
) -> Result<Vec<JoinRecord>> {
    let records = platform.member_added_events(enterprise).await?;
    info!(
        "Found {} member-added events for enterprise {}",
        records.len(),
        enterprise
    );
    Ok(records)
}

/// Collapse events to one per user. A user added more than once keeps the
/// earliest event.
pub fn earliest_join_by_user(records: &[JoinRecord]) -> BTreeMap<&str, &JoinRecord> {
    let mut by_user: BTreeMap<&str, &JoinRecord> = BTreeMap::new();
    for record in records {
        by_user
            .entry(record.user.as_str())
            .and_modify(|current| {
                if record.created_at < current.created_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    by_user
}
