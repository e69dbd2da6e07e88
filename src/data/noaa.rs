//! Download of the NOAA GML monthly Mauna Loa CO2 record.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

pub const DEFAULT_URL: &str = "https://gml.noaa.gov/webdata/ccgg/trends/co2/co2_mm_mlo.txt";

/// Environment variable (or `.env` entry) overriding `DEFAULT_URL`.
pub const URL_ENV: &str = "TRENDFIT_DATA_URL";

const TIMEOUT: Duration = Duration::from_secs(30);

pub struct NoaaClient {
    client: Client,
    url: String,
}

impl NoaaClient {
    /// Client for `TRENDFIT_DATA_URL` (after loading `.env`) or the default URL.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let url = std::env::var(URL_ENV).unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::with_url(url)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw text of the data file.
    pub fn fetch_text(&self) -> Result<String, AppError> {
        info!(url = %self.url, "downloading dataset");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::Network(format!("Request to {} failed: {e}", self.url)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("{} returned HTTP {status}.", self.url)));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::Network(format!("Failed to read response body: {e}")))?;
        if body.trim().is_empty() {
            return Err(AppError::Network(format!("{} returned an empty body.", self.url)));
        }
        info!(bytes = body.len(), "dataset downloaded");
        Ok(body)
    }
}
