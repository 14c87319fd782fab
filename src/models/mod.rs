pub mod batch;
pub mod dispensing;
pub mod error;
pub mod inventory;
pub mod scan;

pub use batch::{generate_batch_id, BatchDescriptor, BatchFields, BatchStatus, DrugBatch};
pub use dispensing::{is_valid_patient_id, DispensingFields, DispensingRecord, DispensingStatus};
pub use error::{LedgerError, LedgerResult};
pub use inventory::{AlertSeverity, DemandForecast, InventoryAlert, InventoryAlertType, LocationType, StockLevel};
pub use scan::{ActionType, ScanFields, ScanRecord, ScanRequest, ScanStatus, ScannerRole};
