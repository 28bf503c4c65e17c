use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{Bracket, BracketTable};

pub const EARLY_WITHDRAWAL_PENALTY_RATE: Decimal = dec!(0.10);

pub const DEFAULT_EXCHANGE_RATE_USD_TO_INR: Decimal = dec!(87);

// 2025 federal, single filer. Income above the last bound is taxed at 37%.
const US_FEDERAL_2025: [Bracket; 6] = [
    Bracket::new(dec!(11925), dec!(0.10)),
    Bracket::new(dec!(48475), dec!(0.12)),
    Bracket::new(dec!(103350), dec!(0.22)),
    Bracket::new(dec!(197300), dec!(0.24)),
    Bracket::new(dec!(250525), dec!(0.32)),
    Bracket::new(dec!(626350), dec!(0.35)),
];
const US_FEDERAL_2025_TOP_RATE: Decimal = dec!(0.37);

// 2025 new-regime slabs. Income above the last bound is taxed at 30%.
const INDIA_2025: [Bracket; 5] = [
    Bracket::new(dec!(300000), dec!(0)),
    Bracket::new(dec!(700000), dec!(0.05)),
    Bracket::new(dec!(1000000), dec!(0.10)),
    Bracket::new(dec!(1200000), dec!(0.15)),
    Bracket::new(dec!(1500000), dec!(0.20)),
];
const INDIA_2025_TOP_RATE: Decimal = dec!(0.30);

/// Tax year whose bracket tables drive the computation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TaxYear {
    #[default]
    Y2025,
}

impl TaxYear {
    pub fn from_year(year: i32) -> Option<Self> {
        match year {
            2025 => Some(TaxYear::Y2025),
            _ => None,
        }
    }

    pub fn year(self) -> i32 {
        match self {
            TaxYear::Y2025 => 2025,
        }
    }

    pub fn tables(self) -> TaxTables {
        match self {
            TaxYear::Y2025 => TaxTables {
                us_federal: BracketTable::new(US_FEDERAL_2025.to_vec(), US_FEDERAL_2025_TOP_RATE)
                    .expect("2025 U.S. table is sorted with rates in [0, 1)"),
                india: BracketTable::new(INDIA_2025.to_vec(), INDIA_2025_TOP_RATE)
                    .expect("2025 India table is sorted with rates in [0, 1)"),
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaxTables {
    pub us_federal: BracketTable,
    pub india: BracketTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_2025_is_supported() {
        assert_eq!(TaxYear::from_year(2025), Some(TaxYear::Y2025));
        assert_eq!(TaxYear::from_year(2024), None);
        assert_eq!(TaxYear::from_year(2026), None);
        assert_eq!(TaxYear::default().year(), 2025);
    }

    #[test]
    fn tables_2025_carry_expected_top_rates() {
        let tables = TaxYear::Y2025.tables();
        assert_eq!(tables.us_federal.top_rate(), dec!(0.37));
        assert_eq!(tables.india.top_rate(), dec!(0.30));
        assert_eq!(tables.us_federal.brackets().len(), 6);
        assert_eq!(tables.india.brackets().len(), 5);
        assert_eq!(
            tables.us_federal.brackets().last().map(|b| b.upper_bound),
            Some(dec!(626350))
        );
        assert_eq!(
            tables.india.brackets().first().map(|b| b.rate),
            Some(Decimal::ZERO)
        );
    }
}
