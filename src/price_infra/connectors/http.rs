use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Shared HTTP client. Every adapter request goes through [`HttpClient::get_text`],
/// which retries transport failures and non-success statuses a bounded number
/// of times after a fixed delay.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    retry_delay: Duration,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {e}")))?;

        Ok(HttpClient {
            client,
            retry_delay: config.retry_delay(),
            max_retries: config.max_retries,
        })
    }

    pub async fn get_text(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let mut attempt = 0;
        let mut first_error = None;

        loop {
            match self.try_get(url, headers.clone()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tracing::debug!(url, attempt, error = %e, "Request failed, retrying");
                    first_error.get_or_insert(e);
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(first_error.unwrap_or(e)),
            }
        }
    }

    pub async fn get_json(&self, url: &str, headers: HeaderMap) -> Result<serde_json::Value> {
        let body = self.get_text(url, headers).await?;
        serde_json::from_str(&body).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    async fn try_get(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
