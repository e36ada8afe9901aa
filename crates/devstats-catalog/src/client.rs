use async_trait::async_trait;
use devstats_core::{Catalog, CatalogError, CatalogResult, CatalogSettings, CatalogUser};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Configuration for the catalog REST client
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn from_settings(
        client_id: String,
        client_secret: SecretString,
        settings: &CatalogSettings,
    ) -> Self {
        Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// Catalog client authenticated with a client id/secret pair.
///
/// The access token is requested on first use and reused for the rest of the
/// run.
pub struct CatalogClient {
    config: CatalogConfig,
    client: Client,
    token: OnceCell<SecretString>,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        if config.client_id.is_empty() || config.client_secret.expose_secret().is_empty() {
            return Err(CatalogError::Client(
                "Catalog credentials are required. Set PORT_CLIENT_ID and PORT_CLIENT_SECRET."
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Client(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    async fn access_token(&self) -> CatalogResult<&SecretString> {
        self.token
            .get_or_try_init(|| async {
                let url = self.url("/auth/access_token");
                let request = TokenRequest {
                    client_id: &self.config.client_id,
                    client_secret: self.config.client_secret.expose_secret(),
                };
                let response = self
                    .client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| CatalogError::Auth(format!("{}: {}", url, e)))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CatalogError::Auth(format!("HTTP {}: {}", status, body)));
                }

                let token: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| CatalogError::Auth(format!("unreadable token response: {}", e)))?;
                info!("Obtained catalog access token");
                Ok(SecretString::from(token.access_token))
            })
            .await
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> CatalogResult<Response> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| CatalogError::Transport {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CatalogError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> CatalogResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode {
                endpoint: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn get_entities(&self, blueprint: &str) -> CatalogResult<Vec<CatalogUser>> {
        let url = self.url(&format!("/blueprints/{}/entities", blueprint));
        let response = self.send(&url, self.client.get(&url)).await?;
        let body: EntitiesResponse = Self::decode(&url, response).await?;
        debug!("{} returned {} entities", url, body.entities.len());
        Ok(body.entities)
    }

    async fn upsert_entity(&self, blueprint: &str, entity: &CatalogUser) -> CatalogResult<()> {
        let url = self.url(&format!("/blueprints/{}/entities", blueprint));
        let request = self
            .client
            .post(&url)
            .query(&[("upsert", "true"), ("merge", "false")])
            .json(entity);
        self.send(&url, request).await?;
        Ok(())
    }
}

// Catalog API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: Vec<CatalogUser>,
}
