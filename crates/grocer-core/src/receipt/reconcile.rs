//! Cross-checks between parsed items and the totals printed on a receipt.
//!
//! Receipts print the same money several times (line prices, a subtotal, a
//! grand total, an item count). A parser that misreads a line, misses a
//! discount or glues two names together shows up as a broken identity here,
//! so every check is fatal.

use tracing::{debug, trace};

use crate::error::ReconciliationError;
use crate::models::amount::Amount;

/// Runs named checks and remembers the ones that passed.
#[derive(Debug, Default)]
pub struct Reconciliation {
    passed: Vec<&'static str>,
}

impl Reconciliation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a declared amount equals the derived one (tolerant equality).
    pub fn amounts(
        &mut self,
        check: &'static str,
        declared: &Amount,
        derived: &Amount,
    ) -> Result<&mut Self, ReconciliationError> {
        trace!("{}: declared {} derived {}", check, declared, derived);
        if declared != derived {
            return Err(ReconciliationError {
                check,
                declared: declared.to_string(),
                derived: derived.to_string(),
            });
        }
        self.passed.push(check);
        Ok(self)
    }

    /// Check that a declared count equals the derived one.
    pub fn counts(
        &mut self,
        check: &'static str,
        declared: u32,
        derived: u32,
    ) -> Result<&mut Self, ReconciliationError> {
        trace!("{}: declared {} derived {}", check, declared, derived);
        if declared != derived {
            return Err(ReconciliationError {
                check,
                declared: declared.to_string(),
                derived: derived.to_string(),
            });
        }
        self.passed.push(check);
        Ok(self)
    }

    /// Names of the checks that held, in order.
    pub fn passed(&self) -> &[&'static str] {
        &self.passed
    }

    pub fn finish(self) -> Vec<&'static str> {
        debug!("All {} reconciliation checks passed", self.passed.len());
        self.passed
    }
}
