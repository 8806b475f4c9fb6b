//! Application state shared between the API and background loops.

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::bus::{ResultPublisher, TelemetryChannels};
use crate::config::Config;
use crate::persistence::{params as params_db, Database};
use crate::state::ParamRegistry;

/// Application state - telemetry topics, parameters and published results.
pub struct AppState {
    config: Config,
    database: Option<Database>,
    params: ParamRegistry,
    telemetry: TelemetryChannels,
    results: ResultPublisher,
    loop_heartbeats: DashMap<&'static str, DateTime<Utc>>,
}

impl AppState {
    /// State without durable storage (parameters live in memory only).
    pub fn new(config: Config) -> Self {
        Self {
            config,
            database: None,
            params: ParamRegistry::new(),
            telemetry: TelemetryChannels::new(),
            results: ResultPublisher::new(),
            loop_heartbeats: DashMap::new(),
        }
    }

    pub fn with_database(database: Database, config: Config) -> Self {
        Self {
            database: Some(database),
            ..Self::new(config)
        }
    }

    /// Overlay persisted parameters onto the defaults.
    pub async fn load_from_database(&self) -> Result<()> {
        let Some(db) = self.database.as_ref() else {
            return Ok(());
        };
        let rows = params_db::load_all_params(db.pool()).await?;
        let loaded = self.params.load(rows);
        tracing::info!("Loaded {} persisted parameter(s)", loaded);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    pub fn telemetry(&self) -> &TelemetryChannels {
        &self.telemetry
    }

    pub fn results(&self) -> &ResultPublisher {
        &self.results
    }

    /// Record that a background loop completed an iteration.
    pub fn mark_loop_heartbeat(&self, name: &'static str) {
        self.loop_heartbeats.insert(name, Utc::now());
    }

    /// Last heartbeat of every loop, sorted by loop name.
    pub fn loop_heartbeats(&self) -> Vec<(String, DateTime<Utc>)> {
        let mut beats: Vec<(String, DateTime<Utc>)> = self
            .loop_heartbeats
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect();
        beats.sort_by(|a, b| a.0.cmp(&b.0));
        beats
    }
}
