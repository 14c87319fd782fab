//! Two-sided shipment handshake over verified scans.
//!
//! Within a batch, each `Sent` scan is matched by the next `Received` scan of
//! that batch recorded at a different location. Unmatched scans stay open.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use crate::models::{ActionType, ScanRecord, ScanStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeState {
    Completed,
    /// Dispatched, no receipt yet
    AwaitingReceipt,
    /// Received with no prior dispatch on record
    AwaitingDispatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    pub batch_id: String,
    pub sent_scan: Option<Uuid>,
    pub received_scan: Option<Uuid>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub state: HandshakeState,
}

impl Handshake {
    fn completed(sent: &ScanRecord, received: &ScanRecord) -> Self {
        Self {
            batch_id: sent.batch_id.clone(),
            sent_scan: Some(sent.id),
            received_scan: Some(received.id),
            from_location: Some(sent.scan_location.clone()),
            to_location: Some(received.scan_location.clone()),
            state: HandshakeState::Completed,
        }
    }

    fn awaiting_receipt(sent: &ScanRecord) -> Self {
        Self {
            batch_id: sent.batch_id.clone(),
            sent_scan: Some(sent.id),
            received_scan: None,
            from_location: Some(sent.scan_location.clone()),
            to_location: None,
            state: HandshakeState::AwaitingReceipt,
        }
    }

    fn awaiting_dispatch(received: &ScanRecord) -> Self {
        Self {
            batch_id: received.batch_id.clone(),
            sent_scan: None,
            received_scan: Some(received.id),
            from_location: None,
            to_location: Some(received.scan_location.clone()),
            state: HandshakeState::AwaitingDispatch,
        }
    }

    pub fn involves(&self, scan_id: Uuid) -> bool {
        self.sent_scan == Some(scan_id) || self.received_scan == Some(scan_id)
    }
}

/// Pair scans given in chronological order (oldest first).
/// Output is grouped by batch id.
pub fn pair_shipments<'a, I>(scans: I) -> Vec<Handshake>
where
    I: IntoIterator<Item = &'a ScanRecord>,
{
    let mut by_batch: BTreeMap<&str, Vec<&ScanRecord>> = BTreeMap::new();
    for scan in scans {
        if scan.status == ScanStatus::Verified {
            by_batch.entry(scan.batch_id.as_str()).or_default().push(scan);
        }
    }

    let mut handshakes = Vec::new();
    for scans in by_batch.values() {
        let mut open: VecDeque<&ScanRecord> = VecDeque::new();
        for &scan in scans {
            match scan.action_type {
                ActionType::Sent => open.push_back(scan),
                ActionType::Received => {
                    let idx = open
                        .iter()
                        .position(|sent| sent.scan_location != scan.scan_location);
                    let matched = idx.and_then(|idx| open.remove(idx));
                    handshakes.push(match matched {
                        Some(sent) => Handshake::completed(sent, scan),
                        None => Handshake::awaiting_dispatch(scan),
                    });
                }
            }
        }
        handshakes.extend(open.into_iter().map(Handshake::awaiting_receipt));
    }
    handshakes
}
