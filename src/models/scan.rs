use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::error::{FieldCheck, LedgerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerRole {
    Manufacturer,
    Distributor,
    Hospital,
    Pharmacy,
    Patient,
    Admin,
}

impl fmt::Display for ScannerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScannerRole::Manufacturer => "manufacturer",
            ScannerRole::Distributor => "distributor",
            ScannerRole::Hospital => "hospital",
            ScannerRole::Pharmacy => "pharmacy",
            ScannerRole::Patient => "patient",
            ScannerRole::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Verified,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Received,
    Sent,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Received => f.write_str("received"),
            ActionType::Sent => f.write_str("sent"),
        }
    }
}

/// What the scanning dashboard submits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub qr_code: String,
    pub scan_location: String,
    pub scanner_role: ScannerRole,
    pub action_type: ActionType,
}

/// Fields of a scan once its code has been decoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFields {
    pub qr_code: String,
    pub batch_id: String,
    pub drug_name: String,
    pub scan_location: String,
    pub scanner_role: ScannerRole,
    pub action_type: ActionType,
}

impl ScanFields {
    pub(crate) fn field_check(&self) -> FieldCheck {
        FieldCheck::new()
            .text("qr_code", &self.qr_code)
            .text("batch_id", &self.batch_id)
            .text("drug_name", &self.drug_name)
            .text("scan_location", &self.scan_location)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        self.field_check().finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub qr_code: String,
    pub batch_id: String,
    pub drug_name: String,
    pub scan_location: String,
    pub scanner_role: ScannerRole,
    pub timestamp: DateTime<Utc>,
    pub blockchain_tx_id: String,
    pub status: ScanStatus,
    pub action_type: ActionType,
}
