pub mod chain;
pub mod credentials;
pub mod tracking;

pub use chain::{ConfirmationProvider, MockChainService, TxKind};
pub use credentials::{CredentialCheck, Operator, PasscodeCheck};
pub use tracking::{DispenseOutcome, TrackingService};
