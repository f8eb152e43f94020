//! Forwards computed shipments to the remote persistence service.
//!
//! Saving happens in a detached task after the plan has been returned. A
//! failed save is logged and never rolls back or delays the planning result.

use std::time::Duration;

use jiff::Timestamp;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::PersistenceConfig;
use crate::metrics::{AggregateResult, ContainerClass};
use crate::model::ItemDescriptor;

const SHIPMENTS_PATH: &str = "/api/shipments";

fn user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    format!("sea-freight-planner/{version} ({os}; {arch})")
}

/// Errors from the persistence service.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("request to persistence service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("persistence service answered {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Payload sent to the persistence service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub items: Vec<ItemDescriptor>,
    /// Total volume in cubic meters (3 decimals)
    pub cbm: f64,
    /// Total weight in kg
    pub weight: f64,
    pub container: ContainerClass,
    /// RFC 3339 UTC timestamp with millisecond precision
    pub timestamp: String,
}

impl ShipmentRecord {
    /// Creates a record stamped with the current time.
    pub fn new(items: Vec<ItemDescriptor>, metrics: &AggregateResult) -> Self {
        Self::at(items, metrics, Timestamp::now())
    }

    /// Creates a record with an explicit timestamp.
    pub fn at(items: Vec<ItemDescriptor>, metrics: &AggregateResult, timestamp: Timestamp) -> Self {
        Self {
            items,
            cbm: metrics.total_volume_cbm,
            weight: metrics.total_weight_kg,
            container: metrics.recommended_container,
            timestamp: format!("{:.3}", timestamp),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SaveAcknowledgement {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the persistence service.
#[derive(Clone, Debug)]
pub struct PersistenceClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PersistenceClient {
    /// Builds a client for `<base_url>/api/shipments`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SHIPMENTS_PATH),
        })
    }

    /// URL the records are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one record and returns the acknowledgement message, if any.
    pub async fn save(&self, record: &ShipmentRecord) -> Result<Option<String>, PersistenceError> {
        let response = self.client.post(&self.endpoint).json(record).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(_) => String::from("unknown response"),
            };
            return Err(PersistenceError::Rejected { status, body });
        }

        let body = response.text().await?;
        let ack: SaveAcknowledgement = serde_json::from_str(&body).unwrap_or_else(|err| {
            warn!("⚠️ Persistence acknowledgement is not valid JSON: {err}");
            SaveAcknowledgement::default()
        });
        Ok(ack.message)
    }
}

/// Launches a save without waiting for completion.
///
/// Returns `None` when persistence is disabled. The returned handle can be
/// awaited to observe completion; errors are logged inside the task.
pub fn save_shipment_background(
    config: &PersistenceConfig,
    record: ShipmentRecord,
) -> Option<JoinHandle<()>> {
    let Some(base_url) = config.base_url() else {
        info!("ℹ️ Persistence disabled, shipment not saved.");
        return None;
    };

    let client = match PersistenceClient::new(base_url, config.timeout()) {
        Ok(client) => client,
        Err(err) => {
            error!("❌ Could not create persistence client: {err}");
            return None;
        }
    };

    Some(tokio::spawn(async move {
        match client.save(&record).await {
            Ok(Some(message)) => info!("💾 Shipment saved: {message}"),
            Ok(None) => info!("💾 Shipment saved."),
            Err(err) => error!("❌ Error saving shipment: {err}"),
        }
    }))
}
