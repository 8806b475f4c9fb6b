//! HTTP client for the land detector service.

use anyhow::{Context, Result};
use land_core::models::{
    ActuatorArmed, LandDetectionResult, VehicleAcceleration, VehicleLocalPosition,
};
use land_core::ParamValue;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::scenarios::Sample;

/// Subset of `/v1/status` the CLI reports.
#[derive(Debug, Deserialize)]
pub struct ServiceStatus {
    pub total_flight_time_s: f64,
    #[serde(default)]
    pub land_detected: Option<LandDetectionResult>,
}

#[derive(Debug, Serialize)]
struct SetParamRequest {
    value: ParamValue,
}

/// Parse a `NAME=VALUE` parameter override.
///
/// Values with a decimal point or exponent are floats, the rest integers.
pub fn parse_param_assignment(raw: &str) -> Result<(String, ParamValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }

    let parsed = if value.contains(['.', 'e', 'E']) {
        value.parse::<f32>().map(ParamValue::Float).map_err(|e| e.to_string())
    } else {
        value.parse::<i32>().map(ParamValue::Int).map_err(|e| e.to_string())
    };
    parsed
        .map(|value| (name.to_string(), value))
        .map_err(|err| format!("invalid value for {}: {}", name, err))
}

/// Client for posting telemetry and reading land detection results.
pub struct LandClient {
    base_url: String,
    client: reqwest::Client,
}

impl LandClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the service (e.g., "http://localhost:3000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_armed(&self, armed: &ActuatorArmed) -> Result<()> {
        self.post_telemetry("armed", armed).await
    }

    pub async fn send_acceleration(&self, acceleration: &VehicleAcceleration) -> Result<()> {
        self.post_telemetry("acceleration", acceleration).await
    }

    pub async fn send_local_position(&self, position: &VehicleLocalPosition) -> Result<()> {
        self.post_telemetry("local-position", position).await
    }

    /// Send every topic of a scenario sample, position last.
    pub async fn send_sample(&self, sample: &Sample) -> Result<()> {
        self.send_armed(&sample.armed).await?;
        self.send_acceleration(&sample.acceleration).await?;
        self.send_local_position(&sample.local_position).await
    }

    /// Latest published result, `None` before the first publish.
    pub async fn land_detected(&self) -> Result<Option<LandDetectionResult>> {
        let url = format!("{}/v1/land-detected", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch land detection state")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let result = response.error_for_status()?.json().await?;
        Ok(Some(result))
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        let url = format!("{}/v1/status", self.base_url);
        let status = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch service status")?
            .error_for_status()?
            .json()
            .await?;
        Ok(status)
    }

    pub async fn set_param(&self, name: &str, value: ParamValue) -> Result<()> {
        let url = format!("{}/v1/params/{}", self.base_url, name);
        self.client
            .put(&url)
            .json(&SetParamRequest { value })
            .send()
            .await
            .with_context(|| format!("Failed to set parameter {}", name))?
            .error_for_status()?;
        Ok(())
    }

    async fn post_telemetry<T: Serialize>(&self, topic: &str, body: &T) -> Result<()> {
        let url = format!("{}/v1/telemetry/{}", self.base_url, topic);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} telemetry", topic))?
            .error_for_status()?;
        Ok(())
    }
}
