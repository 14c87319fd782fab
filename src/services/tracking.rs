use chrono::{Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::codec::qr;
use crate::models::{
    generate_batch_id, BatchDescriptor, BatchFields, BatchStatus, DispensingFields, DispensingRecord,
    DrugBatch, InventoryAlert, LedgerError, LedgerResult, ScanFields, ScanRecord, ScanRequest,
    ScanStatus,
};
use crate::services::chain::{ConfirmationProvider, TxKind};
use crate::services::credentials::{CredentialCheck, Operator};
use crate::session::Session;

/// Result of a dispensing action
#[derive(Debug, Clone, Serialize)]
pub struct DispenseOutcome {
    pub record: DispensingRecord,
    pub alerts: Vec<InventoryAlert>,
}

/// Dashboard actions against a session.
///
/// Every action validates first, then waits for chain confirmation, and only
/// then touches session state. Dropping an action's future before the
/// confirmation resolves leaves the session unchanged.
#[derive(Clone)]
pub struct TrackingService {
    session: Session,
    chain: Arc<dyn ConfirmationProvider>,
    credentials: Arc<dyn CredentialCheck>,
}

impl TrackingService {
    pub fn new(
        session: Session,
        chain: Arc<dyn ConfirmationProvider>,
        credentials: Arc<dyn CredentialCheck>,
    ) -> Self {
        Self {
            session,
            chain,
            credentials,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Scan a batch QR code at a location
    #[instrument(skip(self, request), fields(location = %request.scan_location, action = %request.action_type))]
    pub async fn scan(&self, request: ScanRequest) -> LedgerResult<ScanRecord> {
        let Some(scanned) = qr::decode(&request.qr_code) else {
            warn!("❌ Scanned code could not be decoded");
            return Err(LedgerError::InvalidCode);
        };

        let (descriptor, status) = {
            let state = self.session.read().await;
            let registered = state.registry.get(&scanned.batch_id);
            resolve_against_registry(scanned, registered)
        };

        let fields = ScanFields {
            qr_code: request.qr_code,
            batch_id: descriptor.batch_id,
            drug_name: descriptor.drug_name,
            scan_location: request.scan_location,
            scanner_role: request.scanner_role,
            action_type: request.action_type,
        };
        fields.validate()?;

        let tx_id = self.chain.confirm(TxKind::Scan).await?;

        let mut state = self.session.write().await;
        state.ledger.append_scan(fields, status, tx_id)
    }

    /// Dispense medicine to a patient
    #[instrument(skip(self, operator, fields), fields(operator_id = %operator.id, batch_id = %fields.batch_id))]
    pub async fn dispense(&self, operator: &Operator, fields: DispensingFields) -> LedgerResult<DispenseOutcome> {
        self.credentials.authorize(operator)?;
        fields.validate()?;
        let quantity = u32::try_from(fields.quantity)
            .map_err(|_| LedgerError::ValidationError(format!("quantity {} is out of range", fields.quantity)))?;

        {
            let state = self.session.read().await;
            check_batch_dispensable(state.registry.get(&fields.batch_id), &fields)?;
            state
                .inventory
                .check_available(&fields.location, &fields.drug_name, quantity)?;
        }

        let tx_id = self.chain.confirm(TxKind::Dispense).await?;

        let mut state = self.session.write().await;
        // The batch and its stock may have moved while the confirmation was pending
        check_batch_dispensable(state.registry.get(&fields.batch_id), &fields)?;
        state
            .inventory
            .check_available(&fields.location, &fields.drug_name, quantity)?;
        let location = fields.location.clone();
        let drug_name = fields.drug_name.clone();
        let record = state.ledger.append_dispensing(fields, tx_id)?;
        let alerts = state
            .inventory
            .withdraw(&location, &drug_name, quantity, record.timestamp.month())?;

        Ok(DispenseOutcome { record, alerts })
    }

    /// Register a newly manufactured batch and issue its QR code
    #[instrument(skip(self, operator, fields), fields(operator_id = %operator.id, drug = %fields.drug_name))]
    pub async fn register_batch(&self, operator: &Operator, fields: BatchFields) -> LedgerResult<DrugBatch> {
        self.credentials.authorize(operator)?;
        fields.validate()?;

        let batch_id = generate_batch_id(Utc::now(), &mut rand::thread_rng());
        let qr_code = qr::encode(&BatchDescriptor::new(&batch_id, &fields.drug_name, &fields.manufacturer));
        debug!(%batch_id, "issued batch id");

        let tx_id = self.chain.confirm(TxKind::Batch).await?;

        let mut state = self.session.write().await;
        state.registry.register(batch_id, fields, qr_code, tx_id, Utc::now())
    }

    /// Move a registered batch to its next status
    #[instrument(skip(self, operator), fields(operator_id = %operator.id))]
    pub async fn update_batch_status(
        &self,
        operator: &Operator,
        batch_id: &str,
        status: BatchStatus,
    ) -> LedgerResult<DrugBatch> {
        self.credentials.authorize(operator)?;
        self.session.read().await.registry.check_transition(batch_id, status)?;

        let tx_id = self.chain.confirm(TxKind::Status).await?;

        let mut state = self.session.write().await;
        state.registry.update_status(batch_id, status, tx_id, Utc::now())
    }
}

/// A registered batch that disagrees with the scanned code marks the scan
/// invalid; otherwise blank descriptor fields are filled from the registry.
fn resolve_against_registry(
    scanned: BatchDescriptor,
    registered: Option<&DrugBatch>,
) -> (BatchDescriptor, ScanStatus) {
    match registered {
        Some(batch) if batch.matches(&scanned) => (batch.descriptor(), ScanStatus::Verified),
        Some(batch) => {
            warn!(
                batch_id = %scanned.batch_id,
                scanned_drug = %scanned.drug_name,
                registered_drug = %batch.drug_name,
                "🚨 Scanned code disagrees with the registered batch"
            );
            (scanned, ScanStatus::Invalid)
        }
        None => {
            info!(batch_id = %scanned.batch_id, "Scanned batch is not in the registry");
            (scanned, ScanStatus::Verified)
        }
    }
}

fn check_batch_dispensable(batch: Option<&DrugBatch>, fields: &DispensingFields) -> LedgerResult<()> {
    let Some(batch) = batch else {
        return Ok(());
    };
    if batch.status == BatchStatus::Recalled {
        return Err(LedgerError::ValidationError(format!(
            "batch {} has been recalled",
            batch.batch_id
        )));
    }
    if batch.drug_name != fields.drug_name {
        return Err(LedgerError::ValidationError(format!(
            "batch {} contains {}, not {}",
            batch.batch_id, batch.drug_name, fields.drug_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainSettings;
    use crate::models::{ActionType, DispensingStatus, InventoryAlertType, LocationType, ScannerRole, StockLevel};
    use crate::services::chain::testing::InstantChain;
    use crate::services::chain::MockChainService;
    use crate::services::credentials::PasscodeCheck;
    use chrono::{NaiveDate, TimeZone};
    use std::time::Duration;

    const HOSPITAL: &str = "AIIMS Delhi";

    struct Harness {
        service: TrackingService,
        chain: Arc<InstantChain>,
    }

    fn harness_with(chain: InstantChain) -> Harness {
        let chain = Arc::new(chain);
        let session = Session::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let credentials = Arc::new(PasscodeCheck::new("ADMIN001", "letmein", 4).unwrap());
        Harness {
            service: TrackingService::new(session, chain.clone(), credentials),
            chain,
        }
    }

    fn harness() -> Harness {
        harness_with(InstantChain::default())
    }

    fn admin() -> Operator {
        Operator::new("ADMIN001", "letmein")
    }

    fn scan_request(qr_code: String, action_type: ActionType) -> ScanRequest {
        ScanRequest {
            qr_code,
            scan_location: HOSPITAL.to_string(),
            scanner_role: ScannerRole::Hospital,
            action_type,
        }
    }

    fn paracetamol() -> BatchDescriptor {
        BatchDescriptor::new("BATCH-1", "Paracetamol 500mg", "Sun Pharma")
    }

    fn dispensing(quantity: i64) -> DispensingFields {
        DispensingFields {
            patient_id: "1234-5678-9012".to_string(),
            patient_name: "Rajesh Kumar".to_string(),
            drug_name: "Paracetamol 500mg".to_string(),
            batch_id: "BATCH-1".to_string(),
            quantity,
            location: HOSPITAL.to_string(),
            distributor_name: "MedDistrib North".to_string(),
        }
    }

    fn batch_fields() -> BatchFields {
        BatchFields {
            drug_name: "Amoxicillin 250mg".to_string(),
            manufacturer: "Cipla Ltd".to_string(),
            quantity: 500,
            origin: "Goa".to_string(),
            manufacture_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2025, 8, 20).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_scan_unregistered_batch_is_verified() {
        let h = harness();
        let record = h
            .service
            .scan(scan_request(qr::encode(&paracetamol()), ActionType::Received))
            .await
            .unwrap();

        assert_eq!(record.status, ScanStatus::Verified);
        assert_eq!(record.batch_id, "BATCH-1");
        assert_eq!(record.drug_name, "Paracetamol 500mg");
        assert!(record.blockchain_tx_id.starts_with("TX-SCAN-"));

        let state = h.service.session().read().await;
        assert_eq!(state.ledger.scans().next(), Some(&record));
    }

    #[tokio::test]
    async fn test_invalid_code_records_nothing() {
        let h = harness();
        for code in ["", "QR-garbage", "not a code at all"] {
            let err = h
                .service
                .scan(scan_request(code.to_string(), ActionType::Sent))
                .await
                .unwrap_err();
            assert_eq!(err, LedgerError::InvalidCode);
        }

        assert_eq!(h.chain.issued(), 0);
        assert_eq!(h.service.session().read().await.ledger.scan_count(), 0);
    }

    #[tokio::test]
    async fn test_scan_contradicting_registry_is_invalid() {
        let h = harness();
        let batch = h.service.register_batch(&admin(), batch_fields()).await.unwrap();

        let forged = BatchDescriptor::new(&batch.batch_id, "Paracetamol 500mg", "Cipla Ltd");
        let record = h
            .service
            .scan(scan_request(qr::encode(&forged), ActionType::Received))
            .await
            .unwrap();

        assert_eq!(record.status, ScanStatus::Invalid);
        assert_eq!(record.drug_name, "Paracetamol 500mg");
    }

    #[tokio::test]
    async fn test_partial_code_is_completed_from_registry() {
        let h = harness();
        let batch = h.service.register_batch(&admin(), batch_fields()).await.unwrap();

        let partial = BatchDescriptor::new(&batch.batch_id, "", "");
        let record = h
            .service
            .scan(scan_request(qr::encode(&partial), ActionType::Received))
            .await
            .unwrap();

        assert_eq!(record.status, ScanStatus::Verified);
        assert_eq!(record.drug_name, "Amoxicillin 250mg");
    }

    #[tokio::test]
    async fn test_partial_code_of_unknown_batch_is_missing_drug_name() {
        let h = harness();
        let err = h
            .service
            .scan(scan_request(
                "QR-eyJiYXRjaElkIjoiQkFUQ0gtMWxkZjJnLUFCQ0RFIn0=".to_string(),
                ActionType::Received,
            ))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::MissingFields { fields: vec!["drug_name"] });
        assert_eq!(h.chain.issued(), 0);
    }

    #[tokio::test]
    async fn test_dispense_thirty_starts_sent() {
        let h = harness();
        let outcome = h.service.dispense(&admin(), dispensing(30)).await.unwrap();

        assert_eq!(outcome.record.status, DispensingStatus::Sent);
        assert_eq!(outcome.record.quantity, 30);
        assert!(outcome.record.blockchain_tx_id.starts_with("TX-DISPENSE-"));
        assert!(outcome.alerts.is_empty());

        let state = h.service.session().read().await;
        assert_eq!(state.ledger.dispensings().next(), Some(&outcome.record));
    }

    #[tokio::test]
    async fn test_dispense_rejections_leave_log_unchanged() {
        let h = harness();

        let err = h
            .service
            .dispense(&Operator::new("ADMIN001", "nope"), dispensing(30))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized);

        let err = h.service.dispense(&admin(), dispensing(0)).await.unwrap_err();
        assert_eq!(err, LedgerError::MissingFields { fields: vec!["quantity"] });

        assert_eq!(h.chain.issued(), 0);
        assert_eq!(h.service.session().read().await.ledger.dispensing_count(), 0);
    }

    #[tokio::test]
    async fn test_dispense_draws_down_inventory() {
        let h = harness();
        h.service.session().write().await.inventory.set_level(StockLevel {
            location: HOSPITAL.to_string(),
            drug_name: "Paracetamol 500mg".to_string(),
            current_stock: 40,
            min_threshold: 20,
            max_capacity: 300,
            location_type: LocationType::Urban,
        });

        let outcome = h.service.dispense(&admin(), dispensing(30)).await.unwrap();
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].alert_type, InventoryAlertType::LowStock);

        let err = h.service.dispense(&admin(), dispensing(11)).await.unwrap_err();
        assert_eq!(err, LedgerError::InsufficientStock { requested: 11, available: 10 });
        assert_eq!(h.chain.issued(), 1);
    }

    #[tokio::test]
    async fn test_dispense_from_recalled_batch_is_rejected() {
        let h = harness();
        let batch = h.service.register_batch(&admin(), batch_fields()).await.unwrap();
        h.service
            .update_batch_status(&admin(), &batch.batch_id, BatchStatus::Recalled)
            .await
            .unwrap();

        let mut fields = dispensing(5);
        fields.batch_id = batch.batch_id.clone();
        fields.drug_name = batch.drug_name.clone();
        let err = h.service.dispense(&admin(), fields).await.unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_and_walk_batch_status() {
        let h = harness();
        let batch = h.service.register_batch(&admin(), batch_fields()).await.unwrap();

        assert!(batch.batch_id.starts_with("BATCH-"));
        assert_eq!(batch.status, BatchStatus::Pending);
        assert!(batch.blockchain_tx_id.starts_with("TX-BATCH-"));
        assert_eq!(qr::decode(&batch.qr_code), Some(batch.descriptor()));

        let updated = h
            .service
            .update_batch_status(&admin(), &batch.batch_id, BatchStatus::Dispatched)
            .await
            .unwrap();
        assert_eq!(updated.status, BatchStatus::Dispatched);
        assert!(updated.blockchain_tx_id.starts_with("TX-STATUS-"));

        let err = h
            .service
            .update_batch_status(&admin(), &batch.batch_id, BatchStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::IllegalTransition { .. }));

        let err = h
            .service
            .update_batch_status(&admin(), "BATCH-404", BatchStatus::Dispatched)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BatchNotFound { .. }));
        // Rejected updates never reach the chain
        assert_eq!(h.chain.issued(), 2);
    }

    #[tokio::test]
    async fn test_failed_confirmation_records_nothing() {
        let h = harness_with(InstantChain::failing());
        let err = h
            .service
            .scan(scan_request(qr::encode(&paracetamol()), ActionType::Sent))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConfirmationFailed(_)));
        assert_eq!(h.service.session().read().await.ledger.scan_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_scans_are_independent() {
        let h = harness();
        let (a, b) = tokio::join!(
            h.service.scan(scan_request(qr::encode(&paracetamol()), ActionType::Received)),
            h.service.scan(scan_request(qr::encode(&paracetamol()), ActionType::Received)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.id, b.id);
        assert_ne!(a.blockchain_tx_id, b.blockchain_tx_id);
        assert_eq!(h.service.session().read().await.ledger.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_batch_id_is_reported_missing() {
        let h = harness();
        let blank = BatchDescriptor::new("  ", "Paracetamol 500mg", "Sun Pharma");
        let err = h
            .service
            .scan(scan_request(qr::encode(&blank), ActionType::Received))
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::MissingFields { fields: vec!["batch_id"] });
        assert_eq!(h.chain.issued(), 0);
    }

    #[tokio::test]
    async fn test_dispense_rejects_malformed_patient_id() {
        let h = harness();
        let mut fields = dispensing(5);
        fields.patient_id = "PAT-42".to_string();

        let err = h.service.dispense(&admin(), fields).await.unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));

        let mut fields = dispensing(5);
        fields.patient_id = "EMG007".to_string();
        assert!(h.service.dispense(&admin(), fields).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recall_during_confirmation_blocks_dispense() {
        let session = Session::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let chain = Arc::new(MockChainService::new(ChainSettings {
            min_latency: Duration::from_millis(1000),
            max_latency: Duration::from_millis(1000),
            failure_rate: 0.0,
        }));
        let credentials = Arc::new(PasscodeCheck::new("ADMIN001", "letmein", 4).unwrap());
        let service = TrackingService::new(session, chain, credentials);

        let fields = batch_fields();
        service
            .session()
            .write()
            .await
            .registry
            .register(
                "BATCH-R1".to_string(),
                fields.clone(),
                "QR-R1".to_string(),
                "TX-BATCH-1".to_string(),
                Utc::now(),
            )
            .unwrap();

        let mut order = dispensing(5);
        order.batch_id = "BATCH-R1".to_string();
        order.drug_name = fields.drug_name.clone();

        let pending = service.clone();
        let handle = tokio::spawn(async move { pending.dispense(&admin(), order).await });

        // Recall lands while the dispense is waiting on its confirmation
        tokio::time::sleep(Duration::from_millis(100)).await;
        service
            .session()
            .write()
            .await
            .registry
            .update_status("BATCH-R1", BatchStatus::Recalled, "TX-STATUS-1".to_string(), Utc::now())
            .unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
        assert_eq!(service.session().read().await.ledger.dispensing_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_scan_appends_nothing() {
        let session = Session::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let chain = Arc::new(MockChainService::new(ChainSettings {
            min_latency: Duration::from_millis(800),
            max_latency: Duration::from_millis(800),
            failure_rate: 0.0,
        }));
        let credentials = Arc::new(PasscodeCheck::new("ADMIN001", "letmein", 4).unwrap());
        let service = TrackingService::new(session, chain, credentials);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(100),
            service.scan(scan_request(qr::encode(&paracetamol()), ActionType::Sent)),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(service.session().read().await.ledger.scan_count(), 0);

        let record = service
            .scan(scan_request(qr::encode(&paracetamol()), ActionType::Sent))
            .await
            .unwrap();
        assert!(record.blockchain_tx_id.starts_with("TX-SCAN-"));
        assert_eq!(service.session().read().await.ledger.scan_count(), 1);
    }
}
