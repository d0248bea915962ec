//! Sources module
//!
//! Upstream token exchange and the shared outbound HTTP client.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

pub mod fetch;

/// Outbound client shared by token fetches and message sends.
/// Every request is bounded by `timeout_ms`.
pub fn build_client(timeout_ms: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?)
}
