use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::constants::{EMERGENCY_ID_MAX, EMERGENCY_ID_PREFIX};
use crate::models::error::{FieldCheck, LedgerError, LedgerResult};

/// Dispensing round-trip status.
///
/// `Pending -> Sent -> Received`; every other move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispensingStatus {
    Pending,
    Sent,
    Received,
}

impl DispensingStatus {
    /// Status assigned at creation
    pub const INITIAL: DispensingStatus = DispensingStatus::Sent;

    pub fn can_transition_to(self, next: DispensingStatus) -> bool {
        matches!(
            (self, next),
            (DispensingStatus::Pending, DispensingStatus::Sent)
                | (DispensingStatus::Sent, DispensingStatus::Received)
        )
    }

    pub fn ensure_transition(self, next: DispensingStatus) -> LedgerResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(LedgerError::illegal_transition(self, next))
        }
    }
}

impl fmt::Display for DispensingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispensingStatus::Pending => "pending",
            DispensingStatus::Sent => "sent",
            DispensingStatus::Received => "received",
        };
        f.write_str(s)
    }
}

/// Dispensing form input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispensingFields {
    pub patient_id: String,
    pub patient_name: String,
    pub drug_name: String,
    pub batch_id: String,
    pub quantity: i64,
    pub location: String,
    pub distributor_name: String,
}

impl DispensingFields {
    pub fn validate(&self) -> LedgerResult<()> {
        FieldCheck::new()
            .text("patient_id", &self.patient_id)
            .text("patient_name", &self.patient_name)
            .text("drug_name", &self.drug_name)
            .text("batch_id", &self.batch_id)
            .positive("quantity", self.quantity)
            .text("location", &self.location)
            .text("distributor_name", &self.distributor_name)
            .finish()?;

        if !is_valid_patient_id(self.patient_id.trim()) {
            return Err(LedgerError::ValidationError(format!(
                "patient id {} is neither a 12-digit Aadhaar number nor an emergency id",
                self.patient_id
            )));
        }

        u32::try_from(self.quantity)
            .map(|_| ())
            .map_err(|_| LedgerError::ValidationError(format!("quantity {} is too large", self.quantity)))
    }
}

/// Aadhaar number (`123456789012` or `1234-5678-9012`) or an emergency id
pub fn is_valid_patient_id(id: &str) -> bool {
    is_aadhaar(id) || is_emergency_id(id)
}

fn is_aadhaar(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    let well_formed = match groups.as_slice() {
        [whole] => whole.len() == 12,
        [a, b, c] => a.len() == 4 && b.len() == 4 && c.len() == 4,
        _ => false,
    };
    well_formed
        && groups.iter().all(|g| g.bytes().all(|b| b.is_ascii_digit()))
        && !id.starts_with('0')
}

fn is_emergency_id(id: &str) -> bool {
    let Some(number) = id.strip_prefix(EMERGENCY_ID_PREFIX) else {
        return false;
    };
    number.len() == 3
        && number.bytes().all(|b| b.is_ascii_digit())
        && number
            .parse::<u32>()
            .map(|n| (1..=EMERGENCY_ID_MAX).contains(&n))
            .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispensingRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub patient_name: String,
    pub drug_name: String,
    pub batch_id: String,
    pub quantity: u32,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub blockchain_tx_id: String,
    pub distributor_name: String,
    pub status: DispensingStatus,
}
