use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{manufacturer_sites, BATCH_ID_PREFIX, BATCH_ID_SUFFIX_LEN};
use crate::models::error::{FieldCheck, LedgerError, LedgerResult};

/// Payload embedded in a batch QR code.
///
/// Older printed codes only carry `batchId`, so the descriptive fields
/// default to empty when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDescriptor {
    pub batch_id: String,
    #[serde(default)]
    pub drug_name: String,
    #[serde(default)]
    pub manufacturer: String,
}

impl BatchDescriptor {
    pub fn new(
        batch_id: impl Into<String>,
        drug_name: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            drug_name: drug_name.into(),
            manufacturer: manufacturer.into(),
        }
    }

    /// True when only the batch id is known
    pub fn is_partial(&self) -> bool {
        self.drug_name.is_empty() || self.manufacturer.is_empty()
    }
}

/// Lifecycle of a registered batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Dispatched,
    InTransit,
    Delivered,
    Recalled,
}

impl BatchStatus {
    /// Transition table. Delivered and Recalled are terminal.
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        use BatchStatus::*;
        matches!(
            (self, next),
            (Pending, Dispatched)
                | (Dispatched, InTransit)
                | (InTransit, Delivered)
                | (Pending | Dispatched | InTransit, Recalled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Delivered | BatchStatus::Recalled)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Dispatched => "dispatched",
            BatchStatus::InTransit => "in_transit",
            BatchStatus::Delivered => "delivered",
            BatchStatus::Recalled => "recalled",
        };
        f.write_str(s)
    }
}

/// Input for registering a new batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFields {
    pub drug_name: String,
    pub manufacturer: String,
    pub quantity: i64,
    pub origin: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl BatchFields {
    pub fn validate(&self) -> LedgerResult<()> {
        FieldCheck::new()
            .text("drug_name", &self.drug_name)
            .text("manufacturer", &self.manufacturer)
            .positive("quantity", self.quantity)
            .text("origin", &self.origin)
            .finish()?;

        if u32::try_from(self.quantity).is_err() {
            return Err(LedgerError::ValidationError(format!(
                "quantity {} is too large",
                self.quantity
            )));
        }
        if self.expiry_date <= self.manufacture_date {
            return Err(LedgerError::ValidationError(format!(
                "expiry date {} must be after manufacture date {}",
                self.expiry_date, self.manufacture_date
            )));
        }
        if let Some(sites) = manufacturer_sites(&self.manufacturer) {
            if !sites.contains(&self.origin.as_str()) {
                return Err(LedgerError::ValidationError(format!(
                    "{} does not produce at {} (known sites: {})",
                    self.manufacturer,
                    self.origin,
                    sites.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// A batch as held in the registry (current world state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugBatch {
    pub batch_id: String,
    pub drug_name: String,
    pub manufacturer: String,
    pub quantity: u32,
    pub origin: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: BatchStatus,
    pub qr_code: String,
    pub blockchain_tx_id: String,
    pub updated_at: DateTime<Utc>,
}

impl DrugBatch {
    pub fn descriptor(&self) -> BatchDescriptor {
        BatchDescriptor::new(&self.batch_id, &self.drug_name, &self.manufacturer)
    }

    /// Whether a scanned descriptor agrees with this batch.
    /// Blank descriptor fields are not held against it.
    pub fn matches(&self, scanned: &BatchDescriptor) -> bool {
        scanned.batch_id == self.batch_id
            && (scanned.drug_name.is_empty() || scanned.drug_name == self.drug_name)
            && (scanned.manufacturer.is_empty() || scanned.manufacturer == self.manufacturer)
    }
}

/// `BATCH-<base36 millis>-<uppercase letters>`
pub fn generate_batch_id<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let suffix: String = (0..BATCH_ID_SUFFIX_LEN)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect();
    format!("{BATCH_ID_PREFIX}-{}-{suffix}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
