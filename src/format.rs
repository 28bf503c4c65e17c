use rust_decimal::{Decimal, RoundingStrategy};

pub const USD_SYMBOL: &str = "$";
pub const INR_SYMBOL: &str = "₹";

/// Renders `amount` after `symbol` with thousands separators: whole units once
/// `|amount| >= 1`, two decimals below that. Negative values keep the sign
/// after the symbol, e.g. `$-1,200`. A negative value that rounds to zero
/// renders unsigned (`$0.00`, not `$-0.00`).
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let decimals = if amount.abs() >= Decimal::ONE { 0 } else { 2 };
    let mut rounded =
        amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(decimals);

    let text = rounded.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(text.len() + symbol.len() + whole.len() / 3);
    out.push_str(symbol);
    out.push_str(sign);
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

pub fn format_usd(amount: Decimal) -> String {
    format_currency(amount, USD_SYMBOL)
}

pub fn format_inr(amount: Decimal) -> String {
    format_currency(amount, INR_SYMBOL)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_whole_units_at_or_above_one() {
        assert_eq!(format_usd(dec!(999.999)), "$1,000");
        assert_eq!(format_usd(dec!(1)), "$1");
        assert_eq!(format_usd(dec!(16914.0)), "$16,914");
        assert_eq!(format_inr(dec!(2300000)), "₹2,300,000");
    }

    #[test]
    fn keeps_two_decimals_below_one() {
        assert_eq!(format_usd(dec!(0.5)), "$0.50");
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_inr(Decimal::ZERO), "₹0.00");
        assert_eq!(format_usd(dec!(0.999)), "$1.00");
    }

    #[test]
    fn midpoints_round_to_even() {
        assert_eq!(format_usd(dec!(2.5)), "$2");
        assert_eq!(format_usd(dec!(3.5)), "$4");
        assert_eq!(format_usd(dec!(0.125)), "$0.12");
    }

    #[test]
    fn negative_values_keep_sign_after_symbol() {
        assert_eq!(format_usd(dec!(-1234.4)), "$-1,234");
        assert_eq!(format_usd(dec!(-0.25)), "$-0.25");
        assert_eq!(format_usd(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn groups_every_three_digits() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
        assert_eq!(format_usd(dec!(26436.781609)), "$26,437");
    }
}
