use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::settings::AppConfig;

/// Shared HTTP client for the remote portfolio API. Requests that exceed the
/// configured timeout surface as status-less failures.
pub fn create_client(config: &AppConfig) -> Result<Client, reqwest::Error> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    info!(
        "Remote API client ready for {} (timeout {}s)",
        config.api_base_url, config.api_timeout_secs
    );
    Ok(client)
}
