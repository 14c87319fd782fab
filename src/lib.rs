//! Mock medical supply chain ledger: batch QR codes, custody scans,
//! patient dispensings and a simulated blockchain confirmation step.

pub mod codec;
pub mod config;
pub mod constants;
pub mod ledger;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use config::AppConfig;
pub use models::{LedgerError, LedgerResult};
pub use services::TrackingService;
pub use session::{Session, SessionState};
