use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::ChainSettings;
use crate::constants::TX_PREFIX;
use crate::models::{LedgerError, LedgerResult};

/// Kind of ledger command being confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Scan,
    Dispense,
    Batch,
    Status,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Scan => "SCAN",
            TxKind::Dispense => "DISPENSE",
            TxKind::Batch => "BATCH",
            TxKind::Status => "STATUS",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that acknowledges a ledger command and hands back a tx id
#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    async fn confirm(&self, kind: TxKind) -> LedgerResult<String>;
}

/// Simulated chain: waits out a latency window, then fabricates a tx id.
///
/// Time comes from the tokio clock, so tests can pause and advance it.
pub struct MockChainService {
    settings: ChainSettings,
    counter: AtomicU64,
}

impl MockChainService {
    pub fn new(settings: ChainSettings) -> Self {
        info!(
            min_latency_ms = settings.min_latency.as_millis() as u64,
            max_latency_ms = settings.max_latency.as_millis() as u64,
            failure_rate = settings.failure_rate,
            "⛓️ Mock chain confirmation service created"
        );
        Self {
            settings,
            counter: AtomicU64::new(0),
        }
    }

    fn next_tx_id(&self, kind: TxKind, suffix: u32) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{TX_PREFIX}-{kind}-{n:06}-{suffix:06X}")
    }

    /// Latency, failure roll and random suffix, drawn up front so the
    /// thread-local rng is never held across an await
    fn draw(&self) -> (Duration, bool, u32) {
        let mut rng = rand::thread_rng();
        let min = self.settings.min_latency.as_millis() as u64;
        let max = self.settings.max_latency.as_millis() as u64;
        let latency = if max > min {
            Duration::from_millis(rng.gen_range(min..=max))
        } else {
            self.settings.min_latency
        };
        let fails = self.settings.failure_rate > 0.0
            && rng.gen_bool(self.settings.failure_rate.min(1.0));
        (latency, fails, rng.gen_range(0..0x100_0000))
    }
}

#[async_trait]
impl ConfirmationProvider for MockChainService {
    #[instrument(skip(self))]
    async fn confirm(&self, kind: TxKind) -> LedgerResult<String> {
        let (latency, fails, suffix) = self.draw();
        debug!(latency_ms = latency.as_millis() as u64, "awaiting simulated confirmation");

        tokio::time::sleep(latency).await;

        if fails {
            warn!(%kind, "⚠️ Simulated chain rejected the transaction");
            return Err(LedgerError::ConfirmationFailed(format!(
                "simulated {kind} confirmation was rejected"
            )));
        }

        let tx_id = self.next_tx_id(kind, suffix);
        debug!(%tx_id, "confirmation resolved");
        Ok(tx_id)
    }
}
