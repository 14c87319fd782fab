use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ledger::{BatchRegistry, InventoryBook, LedgerLog};

/// Everything one user session can see and change
#[derive(Debug)]
pub struct SessionState {
    pub ledger: LedgerLog,
    pub registry: BatchRegistry,
    pub inventory: InventoryBook,
}

/// Shared handle to a session's state. Cloning shares the same state.
#[derive(Clone, Debug)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new(ledger_base_date: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                ledger: LedgerLog::new(ledger_base_date),
                registry: BatchRegistry::new(),
                inventory: InventoryBook::new(),
            })),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().await
    }
}
