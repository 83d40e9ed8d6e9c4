// src/utils/http.rs

//! HTTP client utilities shared by the built-in sources.

use std::time::Duration;

use reqwest::Client;

use crate::error::{FetchError, FetchResult, Result};
use crate::models::ClientConfig;

/// Create a configured HTTP client.
pub fn create_client(config: &ClientConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, mapping transport failures and non-success
/// statuses to [`FetchError::Unavailable`].
pub async fn fetch_text(client: &Client, url: &str) -> FetchResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::unavailable(format!("{url} returned {status}")));
    }
    Ok(response.text().await?)
}
