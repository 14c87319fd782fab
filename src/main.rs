use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use medchain_ledger::ledger::Handshake;
use medchain_ledger::models::{
    ActionType, BatchFields, BatchStatus, DispensingFields, DispensingRecord, DrugBatch, InventoryAlert,
    LocationType, ScanRecord, ScanRequest, ScannerRole, StockLevel,
};
use medchain_ledger::services::{MockChainService, Operator, PasscodeCheck, TrackingService};
use medchain_ledger::utils::{display_now, to_display};
use medchain_ledger::{AppConfig, LedgerError, Session};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const FACTORY: &str = "Sun Pharma - Hyderabad";
const WAREHOUSE: &str = "MedDistrib North - Delhi";
const HOSPITAL: &str = "AIIMS Delhi";
const RURAL_CLINIC: &str = "Rural Health Center - Rajasthan";

#[derive(Serialize)]
struct Stamped<'a, T> {
    #[serde(flatten)]
    record: &'a T,
    local_time: String,
}

#[derive(Serialize)]
struct LedgerReport<'a> {
    generated_at: String,
    batches: Vec<&'a DrugBatch>,
    active_batches: usize,
    scans: Vec<Stamped<'a, ScanRecord>>,
    dispensings: Vec<Stamped<'a, DispensingRecord>>,
    handshakes: Vec<Handshake>,
    alerts: Vec<InventoryAlert>,
}

fn stock(location: &str, drug_name: &str, current_stock: u32, location_type: LocationType) -> StockLevel {
    let (min_threshold, max_capacity) = match location_type {
        LocationType::Rural => (50, 300),
        LocationType::Urban => (100, 1000),
    };
    StockLevel {
        location: location.to_string(),
        drug_name: drug_name.to_string(),
        current_stock,
        min_threshold,
        max_capacity,
        location_type,
    }
}

fn scan(qr_code: &str, location: &str, role: ScannerRole, action_type: ActionType) -> ScanRequest {
    ScanRequest {
        qr_code: qr_code.to_string(),
        scan_location: location.to_string(),
        scanner_role: role,
        action_type,
    }
}

/// Walk one batch from the factory floor to a patient
async fn replay_demo(service: &TrackingService, operator: &Operator) -> Result<String> {
    {
        let mut state = service.session().write().await;
        state
            .inventory
            .set_level(stock(HOSPITAL, "Paracetamol 500mg", 450, LocationType::Urban));
        state
            .inventory
            .set_level(stock(RURAL_CLINIC, "Paracetamol 500mg", 60, LocationType::Rural));
        state
            .inventory
            .set_level(stock(RURAL_CLINIC, "Amoxicillin 250mg", 0, LocationType::Rural));
    }

    let batch = service
        .register_batch(
            operator,
            BatchFields {
                drug_name: "Paracetamol 500mg".to_string(),
                manufacturer: "Sun Pharma".to_string(),
                quantity: 1000,
                origin: "Hyderabad".to_string(),
                manufacture_date: NaiveDate::from_ymd_opt(2024, 1, 15).context("invalid manufacture date")?,
                expiry_date: NaiveDate::from_ymd_opt(2026, 1, 15).context("invalid expiry date")?,
            },
        )
        .await?;
    info!("🏭 Registered {} ({})", batch.batch_id, batch.qr_code);

    service
        .update_batch_status(operator, &batch.batch_id, BatchStatus::Dispatched)
        .await?;
    service
        .scan(scan(&batch.qr_code, FACTORY, ScannerRole::Manufacturer, ActionType::Sent))
        .await?;
    service
        .scan(scan(&batch.qr_code, WAREHOUSE, ScannerRole::Distributor, ActionType::Received))
        .await?;

    service
        .update_batch_status(operator, &batch.batch_id, BatchStatus::InTransit)
        .await?;
    service
        .scan(scan(&batch.qr_code, WAREHOUSE, ScannerRole::Distributor, ActionType::Sent))
        .await?;
    service
        .scan(scan(&batch.qr_code, RURAL_CLINIC, ScannerRole::Hospital, ActionType::Received))
        .await?;
    service
        .update_batch_status(operator, &batch.batch_id, BatchStatus::Delivered)
        .await?;

    let outcome = service
        .dispense(
            operator,
            DispensingFields {
                patient_id: "1234-5678-9012".to_string(),
                patient_name: "Rajesh Kumar".to_string(),
                drug_name: batch.drug_name.clone(),
                batch_id: batch.batch_id.clone(),
                quantity: 30,
                location: RURAL_CLINIC.to_string(),
                distributor_name: "MedDistrib North".to_string(),
            },
        )
        .await?;
    for alert in &outcome.alerts {
        warn!("⚠️  {} at {}: {}", alert.drug_name, alert.location, alert.message);
    }

    match service
        .scan(scan("QR-not-a-real-code", HOSPITAL, ScannerRole::Hospital, ActionType::Received))
        .await
    {
        Err(LedgerError::InvalidCode) => info!("Tampered code rejected as expected"),
        other => warn!("Unexpected result for tampered code: {:?}", other),
    }

    Ok(batch.batch_id)
}

async fn print_report(service: &TrackingService, tz: Tz, batch_id: &str) -> Result<()> {
    let state = service.session().read().await;

    let report = LedgerReport {
        generated_at: display_now(tz),
        batches: state.registry.all(),
        active_batches: state.registry.active().count(),
        scans: state
            .ledger
            .scans()
            .map(|record| Stamped {
                record,
                local_time: to_display(record.timestamp, tz),
            })
            .collect(),
        dispensings: state
            .ledger
            .dispensings()
            .map(|record| Stamped {
                record,
                local_time: to_display(record.timestamp, tz),
            })
            .collect(),
        handshakes: state.ledger.handshakes(),
        alerts: state.inventory.alerts(Utc::now().with_timezone(&tz).month()),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize ledger report")?
    );

    let trail: Vec<&str> = state
        .ledger
        .scans_for_batch(batch_id)
        .map(|r| r.scan_location.as_str())
        .collect();
    info!("📍 Custody trail for {}: {}", batch_id, trail.join(" <- "));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with environment-based filtering
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "medchain_ledger=info".to_string()
        } else {
            "medchain_ledger=warn".to_string()
        }
    });

    std::env::set_var("RUST_LOG", &log_level);
    let json_logs = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    info!("🚀 Starting MedChain Ledger v{}", VERSION);

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!("Configuration: {:?}", config);

    let session = Session::new(config.ledger_base_date);
    let chain = Arc::new(MockChainService::new(config.chain.clone()));
    let credentials = Arc::new(
        PasscodeCheck::new(&config.operator_id, &config.operator_passcode, config.bcrypt_cost)
            .context("failed to hash operator passcode")?,
    );
    let service = TrackingService::new(session, chain, credentials);
    let operator = Operator::new(&config.operator_id, &config.operator_passcode);

    let batch_id = match replay_demo(&service, &operator).await {
        Ok(batch_id) => batch_id,
        Err(e) => {
            error!("❌ Demo replay failed: {:#}", e);
            return Err(e);
        }
    };
    print_report(&service, config.display_timezone, &batch_id).await?;

    info!("✅ Demo complete");
    Ok(())
}
