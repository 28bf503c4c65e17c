use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::brackets::{EARLY_WITHDRAWAL_PENALTY_RATE, TaxTables, TaxYear};
use super::error::TaxError;
use super::types::{
    Bracket, IndiaRelief, InteractiveAllocation, PlanClassification, PlanType, Residency,
    ResidencyBreakdown, TaxComparison, TaxResult, WithdrawalRequest,
};

/// Largest withdrawal the adapters accept, in USD.
pub const MAX_WITHDRAWAL_USD: Decimal = dec!(1_000_000_000_000);

/// Largest accepted INR/USD rate. `MAX_WITHDRAWAL_USD * MAX_EXCHANGE_RATE` stays
/// well inside `Decimal` range.
pub const MAX_EXCHANGE_RATE: Decimal = dec!(1_000_000_000_000);

/// Progressive tax on `amount`: each bracket's rate applies only to the slice
/// between the previous bound and its own. An amount equal to a bound stops in
/// that bracket. Brackets past the one containing `amount` are not visited.
pub fn compute_progressive_tax(
    amount: Decimal,
    brackets: &[Bracket],
    top_rate: Decimal,
) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut previous_limit = Decimal::ZERO;

    for bracket in brackets {
        if amount > bracket.upper_bound {
            tax += (bracket.upper_bound - previous_limit) * bracket.rate;
            previous_limit = bracket.upper_bound;
        } else {
            tax += (amount - previous_limit) * bracket.rate;
            return tax;
        }
    }

    tax + (amount - previous_limit) * top_rate
}

pub fn early_withdrawal_penalty(amount_usd: Decimal, is_early: bool) -> Decimal {
    if is_early {
        amount_usd * EARLY_WITHDRAWAL_PENALTY_RATE
    } else {
        Decimal::ZERO
    }
}

/// Lowercases and strips spaces, then maps to Traditional or Roth.
pub fn normalize_plan_type(raw: &str) -> Result<PlanType, TaxError> {
    let normalized = raw.trim().to_lowercase().replace(' ', "");
    match normalized.as_str() {
        "401k" | "ira" | "traditional401k" | "traditionalira" => Ok(PlanType::Traditional),
        "roth401k" | "rothira" | "roth" => Ok(PlanType::Roth),
        _ => Err(TaxError::UnrecognizedPlanType(raw.trim().to_string())),
    }
}

pub fn classify_plan_type(raw: &str) -> PlanClassification {
    match normalize_plan_type(raw) {
        Ok(plan) => PlanClassification::Recognized(plan),
        Err(err) => {
            warn!(plan_type = raw, "{err}");
            PlanClassification::Unrecognized(raw.trim().to_string())
        }
    }
}

/// Boundary check shared by the adapters; the evaluator itself trusts its input.
pub fn validate_amount(amount_usd: Decimal) -> Result<Decimal, TaxError> {
    if amount_usd.is_sign_negative() && !amount_usd.is_zero() {
        return Err(TaxError::InvalidInput(format!(
            "withdrawal amount must be >= 0, got {amount_usd}"
        )));
    }
    if amount_usd > MAX_WITHDRAWAL_USD {
        return Err(TaxError::InvalidInput(format!(
            "withdrawal amount must be <= {MAX_WITHDRAWAL_USD}, got {amount_usd}"
        )));
    }
    Ok(amount_usd)
}

pub fn parse_amount(raw: &str) -> Result<Decimal, TaxError> {
    let normalized = raw.trim().replace(',', "");
    let amount = normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| TaxError::InvalidInput(format!("'{}' is not a number: {e}", raw.trim())))?;
    validate_amount(amount)
}

/// Interactive split: India owes only its excess over U.S. tax, U.S. owes its
/// own tax. Both figures stay in INR.
pub fn allocate_interactive(
    india_tax_inr: Decimal,
    us_tax_in_inr: Decimal,
) -> InteractiveAllocation {
    let india_payable_inr = if india_tax_inr > us_tax_in_inr {
        india_tax_inr - us_tax_in_inr
    } else {
        Decimal::ZERO
    };
    InteractiveAllocation {
        usa_payable_inr: us_tax_in_inr,
        india_payable_inr,
    }
}

pub fn compare_taxes(india_tax_inr: Decimal, us_tax_in_inr: Decimal) -> TaxComparison {
    if us_tax_in_inr > india_tax_inr {
        TaxComparison::UsHigher {
            by_inr: us_tax_in_inr - india_tax_inr,
        }
    } else if india_tax_inr > us_tax_in_inr {
        TaxComparison::IndiaHigher {
            by_inr: india_tax_inr - us_tax_in_inr,
        }
    } else {
        TaxComparison::Equal
    }
}

/// Evaluates withdrawals against one tax year's tables and a fixed exchange rate.
#[derive(Clone, Debug)]
pub struct Evaluator {
    tax_year: TaxYear,
    tables: TaxTables,
    exchange_rate: Decimal,
    india_relief: IndiaRelief,
}

impl Default for Evaluator {
    fn default() -> Self {
        let tax_year = TaxYear::default();
        Self {
            tax_year,
            tables: tax_year.tables(),
            exchange_rate: super::brackets::DEFAULT_EXCHANGE_RATE_USD_TO_INR,
            india_relief: IndiaRelief::default(),
        }
    }
}

impl Evaluator {
    pub fn new(
        tax_year: TaxYear,
        exchange_rate: Decimal,
        india_relief: IndiaRelief,
    ) -> Result<Self, TaxError> {
        if exchange_rate <= Decimal::ZERO || exchange_rate > MAX_EXCHANGE_RATE {
            return Err(TaxError::InvalidInput(format!(
                "exchange rate must be > 0 and <= {MAX_EXCHANGE_RATE}, got {exchange_rate}"
            )));
        }
        Ok(Self {
            tax_year,
            tables: tax_year.tables(),
            exchange_rate,
            india_relief,
        })
    }

    pub fn tax_year(&self) -> TaxYear {
        self.tax_year
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.exchange_rate
    }

    pub fn india_relief(&self) -> IndiaRelief {
        self.india_relief
    }

    pub fn us_tax(&self, amount_usd: Decimal) -> Decimal {
        self.tables.us_federal.tax_on(amount_usd)
    }

    pub fn to_inr(&self, amount_usd: Decimal) -> Decimal {
        amount_usd * self.exchange_rate
    }

    pub fn india_tax(&self, amount_inr: Decimal) -> Decimal {
        self.tables.india.tax_on(amount_inr)
    }

    /// India liability in INR for one residency status.
    pub fn india_liability(
        &self,
        residency: Residency,
        india_tax_inr: Decimal,
        us_tax_in_inr: Decimal,
    ) -> Decimal {
        if !residency.taxed_in_india() {
            return Decimal::ZERO;
        }
        match self.india_relief {
            IndiaRelief::None => india_tax_inr,
            IndiaRelief::ForeignTaxCredit => {
                allocate_interactive(india_tax_inr, us_tax_in_inr).india_payable_inr
            }
        }
    }

    pub fn evaluate(&self, request: &WithdrawalRequest) -> TaxResult {
        let amount_usd = request.amount_usd;
        let plan = classify_plan_type(&request.plan_type);

        let us_tax_usd = self.us_tax(amount_usd);
        let inr_amount = self.to_inr(amount_usd);
        let india_tax_inr = self.india_tax(inr_amount);
        let penalty_usd = early_withdrawal_penalty(amount_usd, request.is_early);
        let us_tax_in_inr = us_tax_usd * self.exchange_rate;

        let total_deductions_usd = us_tax_usd + penalty_usd;

        let residencies = match request.residency {
            Some(residency) => vec![residency],
            None => Residency::ALL.to_vec(),
        }
        .into_iter()
        .map(|residency| {
            let india_tax_val = self.india_liability(residency, india_tax_inr, us_tax_in_inr);
            let total_deducted_usd =
                us_tax_usd + penalty_usd + india_tax_val / self.exchange_rate;
            ResidencyBreakdown {
                residency,
                usa_tax_usd: us_tax_usd,
                india_tax_inr: india_tax_val,
                penalty_usd,
                total_deducted_usd,
                total_receivable_usd: amount_usd - total_deducted_usd,
            }
        })
        .collect();

        debug!(
            %amount_usd,
            is_early = request.is_early,
            %us_tax_usd,
            %inr_amount,
            %india_tax_inr,
            %penalty_usd,
            "evaluated withdrawal"
        );

        TaxResult {
            amount_usd,
            is_early: request.is_early,
            plan,
            exchange_rate: self.exchange_rate,
            us_tax_usd,
            penalty_usd,
            inr_amount,
            india_tax_inr,
            us_tax_in_inr,
            comparison: compare_taxes(india_tax_inr, us_tax_in_inr),
            allocation: allocate_interactive(india_tax_inr, us_tax_in_inr),
            total_deductions_usd,
            net_amount_usd: amount_usd - total_deductions_usd,
            residencies,
        }
    }
}
