use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TaxError;

/// One explicit bracket: income up to `upper_bound` is taxed at `rate`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    pub upper_bound: Decimal,
    pub rate: Decimal,
}

impl Bracket {
    pub const fn new(upper_bound: Decimal, rate: Decimal) -> Self {
        Self { upper_bound, rate }
    }
}

/// Ordered brackets plus the unbounded rate applied past the last bound.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BracketTable {
    brackets: Vec<Bracket>,
    top_rate: Decimal,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>, top_rate: Decimal) -> Result<Self, TaxError> {
        let mut previous: Option<Decimal> = None;
        for bracket in &brackets {
            if bracket.upper_bound.is_sign_negative() {
                return Err(TaxError::invalid_table(format!(
                    "bound {} is negative",
                    bracket.upper_bound
                )));
            }
            if let Some(prev) = previous {
                if bracket.upper_bound <= prev {
                    return Err(TaxError::invalid_table(format!(
                        "bound {} does not exceed previous bound {prev}",
                        bracket.upper_bound
                    )));
                }
            }
            if !is_marginal_rate(bracket.rate) {
                return Err(TaxError::invalid_table(format!(
                    "rate {} outside [0, 1)",
                    bracket.rate
                )));
            }
            previous = Some(bracket.upper_bound);
        }
        if !is_marginal_rate(top_rate) {
            return Err(TaxError::invalid_table(format!(
                "top rate {top_rate} outside [0, 1)"
            )));
        }

        Ok(Self { brackets, top_rate })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    pub fn top_rate(&self) -> Decimal {
        self.top_rate
    }

    pub fn tax_on(&self, amount: Decimal) -> Decimal {
        super::engine::compute_progressive_tax(amount, &self.brackets, self.top_rate)
    }
}

fn is_marginal_rate(rate: Decimal) -> bool {
    !rate.is_sign_negative() && rate < Decimal::ONE
}

/// Indian tax-residency classification.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Residency {
    #[serde(rename = "NRI")]
    Nri,
    #[serde(rename = "RNOR")]
    Rnor,
    #[serde(rename = "ROR")]
    Ror,
}

impl Residency {
    pub const ALL: [Residency; 3] = [Residency::Nri, Residency::Rnor, Residency::Ror];

    pub fn code(self) -> &'static str {
        match self {
            Residency::Nri => "NRI",
            Residency::Rnor => "RNOR",
            Residency::Ror => "ROR",
        }
    }

    /// Whether foreign-sourced withdrawals are taxable in India.
    pub fn taxed_in_india(self) -> bool {
        !matches!(self, Residency::Nri)
    }
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Traditional,
    Roth,
}

/// Outcome of plan-type normalization. Plan type does not feed the tax math.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlanClassification {
    Recognized(PlanType),
    Unrecognized(String),
}

impl PlanClassification {
    pub fn is_roth(&self) -> bool {
        matches!(self, PlanClassification::Recognized(PlanType::Roth))
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanClassification::Recognized(PlanType::Traditional) => "traditional",
            PlanClassification::Recognized(PlanType::Roth) => "roth",
            PlanClassification::Unrecognized(_) => "unrecognized",
        }
    }
}

/// How India liability is derived for India-taxable residencies.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum IndiaRelief {
    /// Full India tax is owed on top of U.S. tax.
    #[default]
    None,
    /// Only the excess of India tax over U.S. tax (both compared in INR) is owed.
    ForeignTaxCredit,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRequest {
    pub amount_usd: Decimal,
    pub is_early: bool,
    pub plan_type: String,
    pub residency: Option<Residency>,
}

/// Which jurisdiction's tax is higher once U.S. tax is expressed in INR.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxComparison {
    UsHigher { by_inr: Decimal },
    IndiaHigher { by_inr: Decimal },
    Equal,
}

/// Interactive-mode split of tax payable. Both figures are INR amounts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InteractiveAllocation {
    pub usa_payable_inr: Decimal,
    pub india_payable_inr: Decimal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResidencyBreakdown {
    pub residency: Residency,
    pub usa_tax_usd: Decimal,
    pub india_tax_inr: Decimal,
    pub penalty_usd: Decimal,
    pub total_deducted_usd: Decimal,
    pub total_receivable_usd: Decimal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaxResult {
    pub amount_usd: Decimal,
    pub is_early: bool,
    pub plan: PlanClassification,
    pub exchange_rate: Decimal,
    pub us_tax_usd: Decimal,
    pub penalty_usd: Decimal,
    pub inr_amount: Decimal,
    pub india_tax_inr: Decimal,
    pub us_tax_in_inr: Decimal,
    pub comparison: TaxComparison,
    pub allocation: InteractiveAllocation,
    /// U.S. tax plus penalty, as the interactive report totals them.
    pub total_deductions_usd: Decimal,
    pub net_amount_usd: Decimal,
    pub residencies: Vec<ResidencyBreakdown>,
}

impl TaxResult {
    pub fn for_residency(&self, residency: Residency) -> Option<&ResidencyBreakdown> {
        self.residencies.iter().find(|r| r.residency == residency)
    }
}
