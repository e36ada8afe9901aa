use crate::pagination::parse_link_header;
use crate::wire::{
    rate_limit_from_headers, AuditEvent, CommitItem, MemberItem, RepositoryItem, SearchResponse,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use devstats_core::{
    GitHubSettings, HostingPlatform, JoinRecord, Member, PlatformError, PlatformResult,
    RateLimit, Repository,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, LINK};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("devstats/", env!("CARGO_PKG_VERSION"));
const API_VERSION_HEADER: &str = "x-github-api-version";

/// Configuration for the GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: SecretString,
    pub api_url: String,
    pub api_version: String,
    pub page_size: u8,
    /// Stop listing after this many pages; `None` follows every `next` link
    pub max_pages: Option<u32>,
    pub timeout_secs: u64,
}

impl GitHubConfig {
    pub fn new(token: SecretString) -> Self {
        Self::from_settings(token, &GitHubSettings::default())
    }

    pub fn from_settings(token: SecretString, settings: &GitHubSettings) -> Self {
        Self {
            token,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// GitHub REST API client
pub struct GitHubClient {
    config: GitHubConfig,
    client: Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> PlatformResult<Self> {
        if config.token.expose_secret().is_empty() {
            return Err(PlatformError::Client(
                "GitHub token is required. Set GITHUB_TOKEN environment variable.".to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.expose_secret()))
            .map_err(|e| PlatformError::Client(format!("invalid token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Client(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    /// Send a GET and fail on any non-2xx status.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        extra: Option<HeaderMap>,
    ) -> PlatformResult<Response> {
        let mut request = self
            .client
            .get(url)
            .header(API_VERSION_HEADER, &self.config.api_version)
            .query(query);
        if let Some(extra) = extra {
            request = request.headers(extra);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Transport {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlatformError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> PlatformResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode {
                endpoint: url.to_string(),
                message: e.to_string(),
            })
    }

    fn links(response: &Response) -> std::collections::HashMap<String, String> {
        response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default()
    }

    /// Collect every item of a listing, following `rel="next"` links up to
    /// the configured page cap.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> PlatformResult<Vec<T>> {
        let mut items = Vec::new();
        let mut url = self.url(path);
        let mut query: Vec<(&str, String)> = query.to_vec();
        query.push(("per_page", self.config.page_size.to_string()));
        let mut pages = 0u32;

        loop {
            let response = self.get(&url, &query, None).await?;
            let next = Self::links(&response).remove("next");
            let page: Vec<T> = Self::decode(&url, response).await?;
            pages += 1;
            debug!("{}: page {} returned {} items", path, pages, page.len());
            items.extend(page);

            let Some(next) = next else {
                break;
            };
            if self.config.max_pages.is_some_and(|max| pages >= max) {
                warn!(
                    "{}: stopping after {} pages, more results are available",
                    path, pages
                );
                break;
            }
            // next links already carry the full query string
            url = next;
            query.clear();
        }
        Ok(items)
    }
}

#[async_trait]
impl HostingPlatform for GitHubClient {
    async fn rate_limit(&self) -> PlatformResult<RateLimit> {
        let response = self.get(&self.url("/rate_limit"), &[], None).await?;
        Ok(rate_limit_from_headers(response.headers()))
    }

    async fn list_members(&self, org: &str) -> PlatformResult<Vec<Member>> {
        let members: Vec<MemberItem> = self
            .get_paginated(&format!("/orgs/{}/members", org), &[])
            .await?;
        Ok(members.into_iter().map(|m| Member::new(m.login)).collect())
    }

    async fn list_repositories(&self, org: &str) -> PlatformResult<Vec<Repository>> {
        let repos: Vec<RepositoryItem> = self
            .get_paginated(&format!("/orgs/{}/repos", org), &[])
            .await?;
        Ok(repos.into_iter().map(|r| Repository::new(r.name)).collect())
    }

    async fn first_commit_date(
        &self,
        org: &str,
        repo: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>> {
        // Commits are listed newest first. With one commit per page the last
        // page holds the oldest one.
        let url = self.url(&format!("/repos/{}/{}/commits", org, repo));
        let query = [("author", author.to_string()), ("per_page", "1".to_string())];
        let response = self.get(&url, &query, None).await?;

        let commits: Vec<CommitItem> = match Self::links(&response).remove("last") {
            Some(last) => {
                let last_page = self.get(&last, &[], None).await?;
                Self::decode(&last, last_page).await?
            }
            None => Self::decode(&url, response).await?,
        };
        Ok(commits.first().and_then(CommitItem::date))
    }

    async fn first_merged_pr_date(
        &self,
        org: &str,
        author: &str,
    ) -> PlatformResult<Option<DateTime<Utc>>> {
        let url = self.url("/search/issues");
        let query = [
            (
                "q",
                format!("author:{} type:pr org:{} is:merged", author, org),
            ),
            ("sort", "created".to_string()),
            ("order", "asc".to_string()),
            ("per_page", "1".to_string()),
        ];
        let mut extra = HeaderMap::new();
        extra.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let response = self.get(&url, &query, Some(extra)).await?;
        let search: SearchResponse = Self::decode(&url, response).await?;
        Ok(search.items.first().map(|item| item.created_at))
    }

    async fn member_added_events(&self, enterprise: &str) -> PlatformResult<Vec<JoinRecord>> {
        let events: Vec<AuditEvent> = self
            .get_paginated(
                &format!("/enterprises/{}/audit-log", enterprise),
                &[
                    ("phrase", "action:org.add_member".to_string()),
                    ("include", "web".to_string()),
                ],
            )
            .await?;

        let mut records = Vec::with_capacity(events.len());
        for event in events {
            match event.into_join_record() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("Skipping audit event without a user"),
                Err(e) => warn!("Skipping unreadable audit event: {}", e),
            }
        }
        Ok(records)
    }
}
