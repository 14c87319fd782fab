use chrono::{DateTime, Duration, Utc};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ledger::handshake::{pair_shipments, Handshake};
use crate::models::error::FieldCheck;
use crate::models::{
    DispensingFields, DispensingRecord, DispensingStatus, LedgerError, LedgerResult, ScanFields,
    ScanRecord, ScanStatus,
};

/// Append-only traceability log, newest record first.
///
/// Each record list keeps its own synthetic timeline: the n-th appended
/// record is stamped `base_date + n days`. A tx id appears at most once
/// across both lists.
#[derive(Debug, Clone)]
pub struct LedgerLog {
    base_date: DateTime<Utc>,
    scans: VecDeque<ScanRecord>,
    dispensings: VecDeque<DispensingRecord>,
    tx_ids: HashSet<String>,
}

impl LedgerLog {
    pub fn new(base_date: DateTime<Utc>) -> Self {
        Self {
            base_date,
            scans: VecDeque::new(),
            dispensings: VecDeque::new(),
            tx_ids: HashSet::new(),
        }
    }

    fn ensure_new_tx(&self, tx_id: &str) -> LedgerResult<()> {
        if self.tx_ids.contains(tx_id) {
            warn!(tx_id, "🚫 Transaction id already recorded");
            return Err(LedgerError::DuplicateTx {
                tx_id: tx_id.to_string(),
            });
        }
        Ok(())
    }

    fn stamp(&self, count: usize) -> DateTime<Utc> {
        self.base_date + Duration::days(count as i64)
    }

    pub fn append_scan(
        &mut self,
        fields: ScanFields,
        status: ScanStatus,
        blockchain_tx_id: String,
    ) -> LedgerResult<ScanRecord> {
        fields
            .field_check()
            .text("blockchain_tx_id", &blockchain_tx_id)
            .finish()?;
        self.ensure_new_tx(&blockchain_tx_id)?;

        let record = ScanRecord {
            id: Uuid::new_v4(),
            qr_code: fields.qr_code,
            batch_id: fields.batch_id,
            drug_name: fields.drug_name,
            scan_location: fields.scan_location,
            scanner_role: fields.scanner_role,
            timestamp: self.stamp(self.scans.len()),
            blockchain_tx_id,
            status,
            action_type: fields.action_type,
        };

        info!(
            scan_id = %record.id,
            batch_id = %record.batch_id,
            action = %record.action_type,
            tx_id = %record.blockchain_tx_id,
            "📦 Scan recorded"
        );
        self.tx_ids.insert(record.blockchain_tx_id.clone());
        self.scans.push_front(record.clone());
        Ok(record)
    }

    pub fn append_dispensing(
        &mut self,
        fields: DispensingFields,
        blockchain_tx_id: String,
    ) -> LedgerResult<DispensingRecord> {
        fields.validate()?;
        FieldCheck::new()
            .text("blockchain_tx_id", &blockchain_tx_id)
            .finish()?;
        self.ensure_new_tx(&blockchain_tx_id)?;

        let quantity = u32::try_from(fields.quantity)
            .map_err(|_| LedgerError::ValidationError(format!("quantity {} is out of range", fields.quantity)))?;

        let record = DispensingRecord {
            id: Uuid::new_v4(),
            patient_id: fields.patient_id,
            patient_name: fields.patient_name,
            drug_name: fields.drug_name,
            batch_id: fields.batch_id,
            quantity,
            timestamp: self.stamp(self.dispensings.len()),
            location: fields.location,
            blockchain_tx_id,
            distributor_name: fields.distributor_name,
            status: DispensingStatus::INITIAL,
        };

        info!(
            dispensing_id = %record.id,
            batch_id = %record.batch_id,
            quantity = record.quantity,
            tx_id = %record.blockchain_tx_id,
            "💊 Dispensing recorded"
        );
        self.tx_ids.insert(record.blockchain_tx_id.clone());
        self.dispensings.push_front(record.clone());
        Ok(record)
    }

    /// Move a dispensing record along the status table
    pub fn transition_dispensing(
        &mut self,
        id: Uuid,
        to: DispensingStatus,
    ) -> LedgerResult<DispensingRecord> {
        let record = self
            .dispensings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| LedgerError::RecordNotFound { id: id.to_string() })?;

        record.status.ensure_transition(to)?;
        debug!(dispensing_id = %id, from = %record.status, %to, "dispensing status transition");
        record.status = to;
        Ok(record.clone())
    }

    pub fn scans(&self) -> impl Iterator<Item = &ScanRecord> {
        self.scans.iter()
    }

    pub fn dispensings(&self) -> impl Iterator<Item = &DispensingRecord> {
        self.dispensings.iter()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    pub fn dispensing_count(&self) -> usize {
        self.dispensings.len()
    }

    pub fn find_scan(&self, id: Uuid) -> Option<&ScanRecord> {
        self.scans.iter().find(|r| r.id == id)
    }

    pub fn find_dispensing(&self, id: Uuid) -> Option<&DispensingRecord> {
        self.dispensings.iter().find(|r| r.id == id)
    }

    /// Custody trail of a batch, newest first
    pub fn scans_for_batch<'a>(&'a self, batch_id: &'a str) -> impl Iterator<Item = &'a ScanRecord> + 'a {
        self.scans.iter().filter(move |r| r.batch_id == batch_id)
    }

    /// Medicines dispensed to one patient, newest first
    pub fn dispensings_for_patient<'a>(
        &'a self,
        patient_id: &'a str,
    ) -> impl Iterator<Item = &'a DispensingRecord> + 'a {
        self.dispensings.iter().filter(move |r| r.patient_id == patient_id)
    }

    /// Pair sent and received scans into shipment handshakes
    pub fn handshakes(&self) -> Vec<Handshake> {
        pair_shipments(self.scans.iter().rev())
    }
}
