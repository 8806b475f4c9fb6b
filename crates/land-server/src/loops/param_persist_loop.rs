//! Parameter persistence loop.
//!
//! Coalesces parameter writes into periodic DB transactions. Failed
//! flushes leave the parameters dirty so the next tick retries them.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::persistence::{params as params_db, Database};
use crate::state::{AppState, ParamRegistry};

pub const LOOP_NAME: &str = "param-persist";

pub async fn run_param_persist_loop(
    db: Database,
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(state.config().param_flush_interval());
    state.mark_loop_heartbeat(LOOP_NAME);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Parameter persistence loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat(LOOP_NAME);
                match flush_dirty(&db, state.params()).await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!("Persisted {} parameter(s)", count),
                    Err(err) => tracing::warn!("Parameter flush failed, will retry: {}", err),
                }
            }
        }
    }

    if let Err(err) = flush_dirty(&db, state.params()).await {
        tracing::warn!("Parameter persistence final flush failed: {}", err);
    }
}

/// Write every dirty parameter in one transaction.
///
/// Returns the number written. On failure the batch is marked dirty again.
pub async fn flush_dirty(db: &Database, params: &ParamRegistry) -> Result<usize> {
    let batch = params.take_dirty();
    if batch.is_empty() {
        return Ok(0);
    }

    let restore = |params: &ParamRegistry| {
        params.mark_dirty(batch.iter().map(|(name, _)| name.clone()));
    };

    let mut tx = match db.pool().begin().await {
        Ok(tx) => tx,
        Err(err) => {
            restore(params);
            return Err(err.into());
        }
    };

    for (name, value) in &batch {
        if let Err(err) = params_db::upsert_param_tx(&mut tx, name, *value).await {
            tx.rollback().await.ok();
            restore(params);
            return Err(err);
        }
    }

    if let Err(err) = tx.commit().await {
        restore(params);
        return Err(err.into());
    }

    Ok(batch.len())
}
