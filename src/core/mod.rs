mod brackets;
mod engine;
mod error;
mod types;

pub use brackets::{
    DEFAULT_EXCHANGE_RATE_USD_TO_INR, EARLY_WITHDRAWAL_PENALTY_RATE, TaxTables, TaxYear,
};
pub use engine::{
    Evaluator, MAX_EXCHANGE_RATE, MAX_WITHDRAWAL_USD, allocate_interactive, classify_plan_type,
    compare_taxes, compute_progressive_tax, early_withdrawal_penalty, normalize_plan_type,
    parse_amount, validate_amount,
};
pub use error::TaxError;
pub use types::{
    Bracket, BracketTable, IndiaRelief, InteractiveAllocation, PlanClassification, PlanType,
    Residency, ResidencyBreakdown, TaxComparison, TaxResult, WithdrawalRequest,
};
