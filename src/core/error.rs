use thiserror::Error;

/// Errors raised by the withdrawal tax core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// Bracket bounds or rates break the progressive-table contract.
    #[error("invalid bracket table: {reason}")]
    InvalidBracketTable { reason: String },

    /// Plan type did not match any known 401k/IRA form. Non-fatal.
    #[error(
        "unrecognized plan type '{0}'; expected one of '401k', 'IRA', 'Roth 401k', or 'Roth IRA'"
    )]
    UnrecognizedPlanType(String),

    /// Caller-supplied value could not be used for a computation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TaxError {
    pub(crate) fn invalid_table(reason: impl Into<String>) -> Self {
        TaxError::InvalidBracketTable {
            reason: reason.into(),
        }
    }
}
