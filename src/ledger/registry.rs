use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::models::{BatchFields, BatchStatus, DrugBatch, LedgerError, LedgerResult};

/// Current world state of registered drug batches, keyed by batch id
#[derive(Debug, Clone, Default)]
pub struct BatchRegistry {
    batches: HashMap<String, DrugBatch>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        batch_id: String,
        fields: BatchFields,
        qr_code: String,
        blockchain_tx_id: String,
        now: DateTime<Utc>,
    ) -> LedgerResult<DrugBatch> {
        fields.validate()?;
        if self.batches.contains_key(&batch_id) {
            warn!(%batch_id, "⚠️ Duplicate batch registration rejected");
            return Err(LedgerError::DuplicateBatch { batch_id });
        }

        let quantity = u32::try_from(fields.quantity)
            .map_err(|_| LedgerError::ValidationError(format!("quantity {} is out of range", fields.quantity)))?;

        let batch = DrugBatch {
            batch_id: batch_id.clone(),
            drug_name: fields.drug_name,
            manufacturer: fields.manufacturer,
            quantity,
            origin: fields.origin,
            manufacture_date: fields.manufacture_date,
            expiry_date: fields.expiry_date,
            status: BatchStatus::Pending,
            qr_code,
            blockchain_tx_id,
            updated_at: now,
        };

        info!(
            %batch_id,
            drug = %batch.drug_name,
            manufacturer = %batch.manufacturer,
            quantity = batch.quantity,
            "🏭 Batch registered"
        );
        self.batches.insert(batch_id, batch.clone());
        Ok(batch)
    }

    /// Check that `batch_id` exists and may move to `to`
    pub fn check_transition(&self, batch_id: &str, to: BatchStatus) -> LedgerResult<()> {
        let batch = self.require(batch_id)?;
        if batch.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(LedgerError::illegal_transition(batch.status, to))
        }
    }

    pub fn update_status(
        &mut self,
        batch_id: &str,
        to: BatchStatus,
        blockchain_tx_id: String,
        now: DateTime<Utc>,
    ) -> LedgerResult<DrugBatch> {
        self.check_transition(batch_id, to)?;
        let batch = self
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| LedgerError::BatchNotFound {
                batch_id: batch_id.to_string(),
            })?;

        info!(%batch_id, from = %batch.status, %to, tx_id = %blockchain_tx_id, "🚚 Batch status updated");
        batch.status = to;
        batch.blockchain_tx_id = blockchain_tx_id;
        batch.updated_at = now;
        Ok(batch.clone())
    }

    pub fn get(&self, batch_id: &str) -> Option<&DrugBatch> {
        self.batches.get(batch_id)
    }

    fn require(&self, batch_id: &str) -> LedgerResult<&DrugBatch> {
        self.get(batch_id).ok_or_else(|| LedgerError::BatchNotFound {
            batch_id: batch_id.to_string(),
        })
    }

    /// All batches sorted by batch id
    pub fn all(&self) -> Vec<&DrugBatch> {
        let mut batches: Vec<&DrugBatch> = self.batches.values().collect();
        batches.sort_by(|a, b| a.batch_id.cmp(&b.batch_id));
        batches
    }

    /// Batches still moving through the supply chain
    pub fn active(&self) -> impl Iterator<Item = &DrugBatch> {
        self.batches.values().filter(|b| !b.status.is_terminal())
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
