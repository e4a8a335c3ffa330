//! HTTP client for the inward challan system, the downstream consumer of
//! computed MOU averages.
//!
//! Notification is best-effort: the trait returns a bool instead of an error
//! so the workflow has a visible, testable branch for absorbed failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::config::API_KEY_HEADER;

/// Downstream endpoint path consuming MOU averages.
pub const MOU_UPDATE_PATH: &str = "/api/inward-challan/update-mou-from-wastage";

/// Total attempts per notification (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;

/// Per-attempt request timeout; expiry counts as a retryable failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Downstream notifier boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MouNotifier: Send + Sync {
    /// Forward the computed average for a challan. Never fails the caller;
    /// any terminal or exhausted failure is logged and reported as `false`.
    async fn notify_average(&self, challan_id: &str, mou_average: Decimal) -> bool;
}

/// Retrying reqwest client for the inward challan API.
pub struct InwardChallanClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    base_delay: Duration,
}

impl InwardChallanClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        if api_key.is_none() {
            warn!("INWARD_API_KEY not configured; calling inward challan API without a key");
        }

        Self {
            http,
            base_url: base_url.into(),
            api_key,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Override the backoff unit (the wait before retry N is N × base_delay).
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), MOU_UPDATE_PATH)
    }
}

#[async_trait]
impl MouNotifier for InwardChallanClient {
    async fn notify_average(&self, challan_id: &str, mou_average: Decimal) -> bool {
        // Preflight: invalid input can never succeed, skip the network entirely
        if challan_id.trim().is_empty() {
            warn!("Refusing MOU update with blank challan id");
            return false;
        }
        if mou_average < Decimal::ZERO {
            warn!(
                "Refusing MOU update with negative average {} for challan {}",
                mou_average, challan_id
            );
            return false;
        }

        let body = serde_json::json!({
            "challan_id": challan_id,
            "mou_average": mou_average,
        });

        for attempt in 1..=MAX_ATTEMPTS {
            let mut request = self.http.post(self.endpoint()).json(&body);
            if let Some(ref key) = self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        "Updated inward challan MOU average for {} (attempt {})",
                        challan_id, attempt
                    );
                    return true;
                }
                // Terminal: the challan does not exist downstream
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    warn!("Inward challan not found: {}", challan_id);
                    return false;
                }
                // Terminal: same input cannot succeed on retry
                Ok(response) if response.status() == StatusCode::BAD_REQUEST => {
                    let detail = response.text().await.unwrap_or_default();
                    warn!(
                        "Bad request updating MOU average for {}: {}",
                        challan_id, detail
                    );
                    return false;
                }
                Ok(response) => {
                    warn!(
                        "MOU update for {} failed with status {} (attempt {})",
                        challan_id,
                        response.status(),
                        attempt
                    );
                }
                Err(e) => {
                    warn!(
                        "MOU update request for {} failed (attempt {}): {}",
                        challan_id, attempt, e
                    );
                }
            }

            // Linear backoff; no wait after the final attempt
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(self.base_delay * attempt).await;
            }
        }

        error!(
            "Giving up on MOU update for {} after {} attempts",
            challan_id, MAX_ATTEMPTS
        );
        false
    }
}
