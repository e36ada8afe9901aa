use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use devstats_core::{
    Catalog, CatalogError, CatalogResult, CatalogUser, Command, CommandReport, DeveloperStats,
    Dispatcher, HostingPlatform, JoinRecord, Member, PlatformError, PlatformResult,
    PropertyMap, PropertyValue, RateLimit, Relations, Repository, StatsError, StatsReporter,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn healthy_quota() -> RateLimit {
    RateLimit {
        limit: 5000,
        remaining: 4200,
        used: 800,
        reset: 1_700_000_000,
    }
}

#[derive(Default)]
struct FakePlatform {
    quota: RateLimit,
    members: Vec<&'static str>,
    repos: Vec<&'static str>,
    commits: HashMap<(&'static str, &'static str), DateTime<Utc>>,
    failing_commits: HashSet<(&'static str, &'static str)>,
    merged_prs: HashMap<&'static str, DateTime<Utc>>,
    failing_prs: HashSet<&'static str>,
    events: Vec<JoinRecord>,
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn boom(endpoint: &str) -> PlatformError {
        PlatformError::Status {
            endpoint: endpoint.to_string(),
            status: 500,
            body: "boom".to_string(),
        }
    }
}

#[async_trait]
impl HostingPlatform for FakePlatform {
    async fn rate_limit(&self) -> PlatformResult<RateLimit> {
        self.record("rate_limit".into());
        Ok(self.quota)
    }

    async fn list_members(&self, org: &str) -> PlatformResult<Vec<Member>> {
        self.record(format!("members:{}", org));
        Ok(self.members.iter().map(|m| Member::new(*m)).collect())
    }

    async fn list_repositories(&self, org: &str) -> PlatformResult<Vec<Repository>> {
        self.record(format!("repos:{}", org));
        Ok(self.repos.iter().map(|r| Repository::new(*r)).collect())
    }

    async fn first_commit_date(
        &self,
        _org: &str,
        repo: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>> {
        self.record(format!("commits:{}:{}", repo, author));
        if self
            .failing_commits
            .iter()
            .any(|(r, a)| *r == repo && *a == author)
        {
            return Err(Self::boom(repo));
        }
        Ok(self
            .commits
            .iter()
            .find(|((r, a), _)| *r == repo && *a == author)
            .map(|(_, date)| *date))
    }

    async fn first_merged_pr_date(
        &self,
        _org: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>> {
        self.record(format!("search:{}", author));
        if self.failing_prs.contains(author) {
            return Err(Self::boom("search/issues"));
        }
        Ok(self.merged_prs.get(author).copied())
    }

    async fn member_added_events(&self, enterprise: &str) -> PlatformResult<Vec<JoinRecord>> {
        self.record(format!("audit:{}", enterprise));
        Ok(self.events.clone())
    }
}

#[derive(Default)]
struct FakeCatalog {
    users: Vec<CatalogUser>,
    failing: HashSet<&'static str>,
    upserts: Mutex<Vec<CatalogUser>>,
    reads: Mutex<usize>,
}

impl FakeCatalog {
    fn upserts(&self) -> Vec<CatalogUser> {
        self.upserts.lock().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn get_entities(&self, _blueprint: &str) -> CatalogResult<Vec<CatalogUser>> {
        *self.reads.lock() += 1;
        Ok(self.users.clone())
    }

    async fn upsert_entity(&self, _blueprint: &str, entity: &CatalogUser) -> CatalogResult<()> {
        if self.failing.contains(entity.identifier.as_str()) {
            return Err(CatalogError::Status {
                endpoint: "entities".into(),
                status: 422,
                body: "invalid".into(),
            });
        }
        self.upserts.lock().push(entity.clone());
        Ok(())
    }
}

fn catalog_user(identifier: &str, properties: serde_json::Value) -> CatalogUser {
    let relations: Relations = json!({"team": "platform"}).as_object().unwrap().clone();
    CatalogUser {
        identifier: identifier.to_string(),
        title: Some(identifier.to_uppercase()),
        properties: serde_json::from_value(properties).unwrap(),
        relations,
    }
}

/// alice and bob in r1/r2; r2 throws for bob.
fn scenario_platform() -> FakePlatform {
    FakePlatform {
        quota: healthy_quota(),
        members: vec!["alice", "bob"],
        repos: vec!["r1", "r2"],
        commits: HashMap::from([
            (("r1", "alice"), day(2023, 1, 5)),
            (("r2", "alice"), day(2023, 2, 1)),
        ]),
        failing_commits: HashSet::from([("r2", "bob")]),
        merged_prs: HashMap::from([("alice", day(2023, 3, 1))]),
        ..Default::default()
    }
}

#[derive(Default)]
struct RecordingReporter {
    stats: Mutex<Vec<DeveloperStats>>,
    joins: Mutex<Vec<JoinRecord>>,
}

impl StatsReporter for RecordingReporter {
    fn join_dates_resolved(&self, records: &[JoinRecord]) {
        self.joins.lock().extend_from_slice(records);
    }

    fn developer_stats_resolved(&self, stats: &[DeveloperStats]) {
        self.stats.lock().extend_from_slice(stats);
    }
}

#[tokio::test]
async fn developer_stats_end_to_end() {
    let platform = scenario_platform();
    let catalog = FakeCatalog {
        users: vec![
            catalog_user("alice", json!({"email": "alice@example.com"})),
            catalog_user("bob", json!({"email": "bob@example.com"})),
        ],
        ..Default::default()
    };
    let reporter = RecordingReporter::default();

    let dispatcher = Dispatcher::new(&platform, &catalog, "acme", "user");
    let report = dispatcher
        .run(&Command::DeveloperStats, &reporter)
        .await
        .unwrap();

    let expected = vec![
        DeveloperStats {
            login: "alice".into(),
            first_commit_date: Some(day(2023, 1, 5)),
            first_pr_date: Some(day(2023, 3, 1)),
        },
        DeveloperStats {
            login: "bob".into(),
            first_commit_date: None,
            first_pr_date: None,
        },
    ];
    match &report {
        CommandReport::DeveloperStats { stats, write } => {
            assert_eq!(stats, &expected);
            assert_eq!(write.updated, vec!["alice".to_string()]);
            assert_eq!(write.skipped, 1);
            assert!(write.failed.is_empty());
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert_eq!(*reporter.stats.lock(), expected);

    let upserts = catalog.upserts();
    assert_eq!(upserts.len(), 1);
    let alice = &upserts[0];
    assert_eq!(alice.identifier, "alice");
    assert_eq!(alice.title.as_deref(), Some("ALICE"));
    assert_eq!(
        serde_json::to_value(&alice.properties).unwrap(),
        json!({
            "email": "alice@example.com",
            "first_commit": "2023-01-05T00:00:00.000Z",
            "first_pr": "2023-03-01T00:00:00.000Z"
        })
    );
    assert_eq!(alice.relations, catalog.users[0].relations);
}

#[tokio::test]
async fn rate_limit_runs_before_everything_else() {
    let platform = scenario_platform();
    let catalog = FakeCatalog {
        users: vec![catalog_user("alice", json!({}))],
        ..Default::default()
    };

    Dispatcher::new(&platform, &catalog, "acme", "user")
        .run(&Command::DeveloperStats, &())
        .await
        .unwrap();

    let calls = platform.calls();
    assert_eq!(calls[0], "rate_limit");
    assert_eq!(calls.iter().filter(|c| *c == "rate_limit").count(), 1);
}

#[tokio::test]
async fn exhausted_quota_aborts_before_any_other_call() {
    let platform = FakePlatform {
        quota: RateLimit {
            limit: 5000,
            remaining: 0,
            used: 5000,
            reset: 1_700_000_000,
        },
        ..scenario_platform()
    };
    let catalog = FakeCatalog {
        users: vec![catalog_user("alice", json!({}))],
        ..Default::default()
    };

    for command in [
        Command::DeveloperStats,
        Command::MemberJoinDates {
            enterprise: "acme-ent".into(),
        },
    ] {
        let err = Dispatcher::new(&platform, &catalog, "acme", "user")
            .run(&command, &())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatsError::RateLimitExceeded { limit: 5000, .. }
        ));
    }

    assert!(platform.calls().iter().all(|c| c == "rate_limit"));
    assert_eq!(*catalog.reads.lock(), 0);
    assert!(catalog.upserts().is_empty());
}

#[tokio::test]
async fn one_stats_entry_per_member_when_every_lookup_fails() {
    let platform = FakePlatform {
        quota: healthy_quota(),
        members: vec!["alice", "bob", "carol"],
        repos: vec!["r1", "r2", "r3"],
        failing_commits: ["r1", "r2", "r3"]
            .into_iter()
            .flat_map(|r| [(r, "alice"), (r, "bob"), (r, "carol")])
            .collect(),
        failing_prs: HashSet::from(["alice", "bob", "carol"]),
        ..Default::default()
    };
    let catalog = FakeCatalog::default();

    let report = Dispatcher::new(&platform, &catalog, "acme", "user")
        .run(&Command::DeveloperStats, &())
        .await
        .unwrap();

    let CommandReport::DeveloperStats { stats, write } = report else {
        panic!("expected developer stats");
    };
    assert_eq!(
        stats.iter().map(|s| s.login.as_str()).collect::<Vec<_>>(),
        vec!["alice", "bob", "carol"]
    );
    assert!(stats.iter().all(|s| !s.has_facts()));
    assert!(write.updated.is_empty());
}

#[tokio::test]
async fn failing_repository_leaves_other_members_intact() {
    let platform = FakePlatform {
        quota: healthy_quota(),
        members: vec!["alice", "bob"],
        // r0 fails for alice only; bob's commit there must still count
        repos: vec!["r2", "r0", "r1"],
        commits: HashMap::from([
            (("r1", "alice"), day(2022, 5, 1)),
            (("r2", "alice"), day(2021, 9, 9)),
            (("r0", "bob"), day(2020, 1, 1)),
            (("r1", "bob"), day(2023, 1, 1)),
        ]),
        failing_commits: HashSet::from([("r0", "alice")]),
        ..Default::default()
    };
    let catalog = FakeCatalog::default();

    let report = Dispatcher::new(&platform, &catalog, "acme", "user")
        .run(&Command::DeveloperStats, &())
        .await
        .unwrap();

    let CommandReport::DeveloperStats { stats, .. } = report else {
        panic!("expected developer stats");
    };
    assert_eq!(stats[0].first_commit_date, Some(day(2021, 9, 9)));
    assert_eq!(stats[1].first_commit_date, Some(day(2020, 1, 1)));
}

#[tokio::test]
async fn join_dates_only_touch_matching_users() {
    let platform = FakePlatform {
        quota: healthy_quota(),
        events: vec![
            JoinRecord {
                user: "alice".into(),
                user_id: Some(11),
                created_at: day(2022, 4, 2),
            },
            JoinRecord {
                user: "ghost".into(),
                user_id: Some(99),
                created_at: day(2022, 4, 3),
            },
        ],
        ..Default::default()
    };
    let catalog = FakeCatalog {
        users: vec![
            catalog_user("alice", json!({"a": 1, "b": 2})),
            catalog_user("bob", json!({"a": 5})),
        ],
        ..Default::default()
    };
    let reporter = RecordingReporter::default();

    let report = Dispatcher::new(&platform, &catalog, "acme", "user")
        .run(
            &Command::MemberJoinDates {
                enterprise: "acme-ent".into(),
            },
            &reporter,
        )
        .await
        .unwrap();

    assert_eq!(report.write().updated, vec!["alice".to_string()]);
    assert_eq!(report.write().skipped, 1);
    assert_eq!(reporter.joins.lock().len(), 2);
    assert!(platform.calls().contains(&"audit:acme-ent".to_string()));

    let upserts = catalog.upserts();
    assert_eq!(upserts.len(), 1);
    let mut expected: PropertyMap = serde_json::from_value(json!({"a": 1, "b": 2})).unwrap();
    expected.insert("join_date".into(), PropertyValue::from(day(2022, 4, 2)));
    assert_eq!(upserts[0].properties, expected);
    assert_eq!(upserts[0].relations, catalog.users[0].relations);
}

#[tokio::test]
async fn failed_upsert_does_not_stop_remaining_users() {
    let platform = FakePlatform {
        quota: healthy_quota(),
        members: vec!["alice", "bob"],
        repos: vec!["r1"],
        commits: HashMap::from([
            (("r1", "alice"), day(2023, 1, 5)),
            (("r1", "bob"), day(2023, 1, 6)),
        ]),
        ..Default::default()
    };
    let catalog = FakeCatalog {
        users: vec![catalog_user("alice", json!({})), catalog_user("bob", json!({}))],
        failing: HashSet::from(["alice"]),
        ..Default::default()
    };

    let report = Dispatcher::new(&platform, &catalog, "acme", "user")
        .run(&Command::DeveloperStats, &())
        .await
        .unwrap();

    assert_eq!(report.write().failed, vec!["alice".to_string()]);
    assert_eq!(report.write().updated, vec!["bob".to_string()]);
    assert_eq!(catalog.upserts().len(), 1);
}
