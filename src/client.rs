//! HTTP access to the reporting services.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::directory::{AccountDirectory, Directories, EndpointCatalog, ZoneDirectory};
use crate::query::QueryRequest;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid service URL {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: StatusCode },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
struct ServiceUrls {
    accounts: Url,
    zones: Url,
    endpoints: Url,
    query: Url,
}

impl ServiceUrls {
    fn from_config(config: &Config) -> Result<Self, ClientError> {
        let mut raw_base = config.base_url.clone();
        if !raw_base.ends_with('/') {
            raw_base.push('/');
        }
        let base = Url::parse(&raw_base).map_err(|err| ClientError::Url {
            url: raw_base.clone(),
            reason: err.to_string(),
        })?;
        let join = |path: &str| {
            base.join(path.trim_start_matches('/'))
                .map_err(|err| ClientError::Url {
                    url: format!("{raw_base}{path}"),
                    reason: err.to_string(),
                })
        };
        Ok(ServiceUrls {
            accounts: join(&config.accounts_path)?,
            zones: join(&config.zones_path)?,
            endpoints: join(&config.endpoints_path)?,
            query: join(&config.query_path)?,
        })
    }
}

/// Client for the account, zone, catalog and query services.
#[derive(Debug, Clone)]
pub struct ReportingClient {
    http: Client,
    urls: ServiceUrls,
}

impl ReportingClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let urls = ServiceUrls::from_config(config)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;
        Ok(ReportingClient { http, urls })
    }

    pub fn query_url(&self) -> &Url {
        &self.urls.query
    }

    pub async fn fetch_accounts(&self) -> Result<AccountDirectory, ClientError> {
        self.get_json(&self.urls.accounts).await
    }

    pub async fn fetch_zones(&self) -> Result<ZoneDirectory, ClientError> {
        self.get_json(&self.urls.zones).await
    }

    pub async fn fetch_endpoints(&self) -> Result<EndpointCatalog, ClientError> {
        self.get_json(&self.urls.endpoints).await
    }

    /// Fetch all three directories, one after another.
    pub async fn load_directories(&self) -> Result<Directories, ClientError> {
        let accounts = self.fetch_accounts().await?;
        let zones = self.fetch_zones().await?;
        let catalog = self.fetch_endpoints().await?;
        debug!(
            "Loaded {} accounts and {} endpoints",
            accounts.len(),
            catalog.metrics().count()
        );
        Ok(Directories {
            accounts,
            zones,
            catalog,
        })
    }

    /// POST a query; the response must be a JSON object keyed by endpoint id.
    pub async fn execute_query(
        &self,
        request: &QueryRequest,
    ) -> Result<Map<String, Value>, ClientError> {
        let url = &self.urls.query;
        debug!("POST {url} for {} endpoints", request.endpoints.len());
        let response = self
            .http
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ClientError> {
        debug!("GET {url}");
        let response =
            self.http
                .get(url.clone())
                .send()
                .await
                .map_err(|source| ClientError::Transport {
                    url: url.clone(),
                    source,
                })?;
        Self::decode(url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        url: &Url,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.clone(),
                status,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode {
                url: url.clone(),
                source,
            })
    }
}
