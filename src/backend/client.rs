use anyhow::{anyhow, Result};
use log::{debug, error, info};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::PayoutSource;
use crate::config::BackendConfig;
use crate::models::{MutationRequest, MutationResult, Payout, PayoutList};

/// HTTP client for the payouts backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // A trailing slash keeps `join` from replacing the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| anyhow!("Invalid backend URL {}: {}", base_url, e))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_list(&self, path: &str) -> Result<Vec<Payout>> {
        let url = self.endpoint(path)?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET /{} returned {}", path, resp.status()));
        }
        let list: PayoutList = resp.json().await?;
        Ok(list.into_payouts())
    }

    async fn mutate(&self, path: &str, ids: &[String]) -> Result<MutationResult> {
        let url = self.endpoint(path)?;
        let resp = self
            .http
            .post(url)
            .json(&MutationRequest { ids })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("POST /{} returned {}", path, resp.status()));
        }
        Ok(resp.json().await?)
    }

    async fn mutate_or_fail(&self, path: &str, ids: &[String]) -> MutationResult {
        match self.mutate(path, ids).await {
            Ok(result) => {
                for (id, reason) in &result.error {
                    error!("/{} rejected {}: {}", path, id, reason);
                }
                info!(
                    "/{}: {} succeeded, {} failed",
                    path,
                    result.success.len(),
                    result.error.len()
                );
                result
            }
            Err(e) => {
                error!("Error calling /{}: {}", path, e);
                MutationResult::failed(ids, &e.to_string())
            }
        }
    }
}

#[async_trait::async_trait]
impl PayoutSource for BackendClient {
    async fn fetch_payouts(&self) -> Vec<Payout> {
        match self.get_list("payouts").await {
            Ok(payouts) => {
                debug!("Fetched {} payouts", payouts.len());
                payouts
            }
            Err(e) => {
                error!("Error fetching payouts: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_pending_payouts(&self) -> Vec<Payout> {
        match self.get_list("pending-payouts").await {
            Ok(payouts) => {
                debug!("Fetched {} pending payouts", payouts.len());
                payouts
            }
            Err(e) => {
                error!("Error fetching pending payouts: {}", e);
                Vec::new()
            }
        }
    }

    async fn accept_payouts(&self, ids: &[String]) -> MutationResult {
        self.mutate_or_fail("accept-payouts", ids).await
    }

    async fn cancel_payouts(&self, ids: &[String]) -> MutationResult {
        self.mutate_or_fail("cancel-payouts", ids).await
    }
}
