use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{LedgerError, LedgerResult};

/// Identifier and passcode presented with a gated action
#[derive(Clone, Deserialize)]
pub struct Operator {
    pub id: String,
    pub passcode: String,
}

impl Operator {
    pub fn new(id: impl Into<String>, passcode: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            passcode: passcode.into(),
        }
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator").field("id", &self.id).finish()
    }
}

/// Decides whether an operator may run a gated action
pub trait CredentialCheck: Send + Sync {
    fn verify(&self, operator_id: &str, passcode: &str) -> bool;

    fn authorize(&self, operator: &Operator) -> LedgerResult<()> {
        if self.verify(&operator.id, &operator.passcode) {
            Ok(())
        } else {
            warn!(operator_id = %operator.id, "🚫 Operator credentials rejected");
            Err(LedgerError::Unauthorized)
        }
    }
}

/// Single demo operator whose passcode is kept as a bcrypt hash
pub struct PasscodeCheck {
    operator_id: String,
    passcode_hash: String,
}

impl PasscodeCheck {
    pub fn new(operator_id: impl Into<String>, passcode: &str, cost: u32) -> Result<Self, bcrypt::BcryptError> {
        let passcode_hash = bcrypt::hash(passcode, cost)?;
        Ok(Self {
            operator_id: operator_id.into(),
            passcode_hash,
        })
    }
}

impl CredentialCheck for PasscodeCheck {
    fn verify(&self, operator_id: &str, passcode: &str) -> bool {
        if operator_id != self.operator_id {
            debug!(operator_id, "unknown operator");
            return false;
        }
        bcrypt::verify(passcode, &self.passcode_hash).unwrap_or(false)
    }
}
