use chrono::{DateTime, SecondsFormat, Utc};
use devstats_core::{DeveloperStats, JoinRecord, StatsReporter, WriteReport};
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Tabled)]
pub struct JoinDateRow {
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "User ID")]
    pub user_id: String,
    #[tabled(rename = "Joined")]
    pub joined: String,
}

impl From<&JoinRecord> for JoinDateRow {
    fn from(record: &JoinRecord) -> Self {
        Self {
            user: record.user.clone(),
            user_id: record
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            joined: timestamp(Some(record.created_at)),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct StatsRow {
    #[tabled(rename = "Login")]
    pub login: String,
    #[tabled(rename = "First commit")]
    pub first_commit: String,
    #[tabled(rename = "First merged PR")]
    pub first_pr: String,
}

impl From<&DeveloperStats> for StatsRow {
    fn from(stats: &DeveloperStats) -> Self {
        Self {
            login: stats.login.clone(),
            first_commit: timestamp(stats.first_commit_date),
            first_pr: timestamp(stats.first_pr_date),
        }
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "-".to_string())
}

/// Prints resolved facts as a table before the catalog is touched.
pub struct TableReporter;

impl StatsReporter for TableReporter {
    fn join_dates_resolved(&self, records: &[JoinRecord]) {
        if records.is_empty() {
            println!("No member-added events found.");
            return;
        }
        let mut table = Table::new(records.iter().map(JoinDateRow::from));
        table.with(Style::rounded());
        println!("{}", table);
    }

    fn developer_stats_resolved(&self, stats: &[DeveloperStats]) {
        if stats.is_empty() {
            println!("No organization members found.");
            return;
        }
        let mut table = Table::new(stats.iter().map(StatsRow::from));
        table.with(Style::rounded());
        println!("{}", table);
    }
}

pub fn summary_line(command: &str, write: &WriteReport) -> String {
    format!(
        "{}: {} updated, {} skipped, {} failed",
        command,
        write.updated.len(),
        write.skipped,
        write.failed.len()
    )
}
