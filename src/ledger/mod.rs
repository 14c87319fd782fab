pub mod event_log;
pub mod forecast;
pub mod handshake;
pub mod inventory;
pub mod registry;

pub use event_log::LedgerLog;
pub use forecast::forecast_demand;
pub use handshake::{Handshake, HandshakeState};
pub use inventory::InventoryBook;
pub use registry::BatchRegistry;
