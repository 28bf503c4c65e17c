use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::info;

use crate::core::{
    Evaluator, PlanClassification, PlanType, TaxComparison, TaxError, TaxResult,
    WithdrawalRequest, parse_amount,
};
use crate::format::{format_inr, format_usd};

const EARLY_PROMPT: &str = "Are you withdrawing before 59½ age? (yes/no): ";
const AMOUNT_PROMPT: &str = "Enter the amount you want to withdraw (USD): ";
const PLAN_PROMPT: &str = "Enter your plan (401k, IRA, Roth 401k, Roth IRA): ";

#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("input ended before '{0}' was answered")]
    EndOfInput(&'static str),

    #[error(transparent)]
    Input(#[from] TaxError),
}

/// `yes`, `y`, `true`, `t` and `1` (any case) mean yes; anything else is no.
pub fn parse_yes_no(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "t" | "1"
    )
}

/// Prompts for the withdrawal, evaluates it, and prints the report.
pub fn run<R: BufRead, W: Write>(
    evaluator: &Evaluator,
    input: &mut R,
    output: &mut W,
) -> Result<TaxResult, InteractiveError> {
    let is_early = parse_yes_no(&prompt(input, output, EARLY_PROMPT, "early withdrawal")?);
    writeln!(output, "Early withdrawal: {}", if is_early { "yes" } else { "no" })?;

    let amount_usd = parse_amount(&prompt(input, output, AMOUNT_PROMPT, "amount")?)?;
    writeln!(output, "You entered withdrawal amount: {}", format_usd(amount_usd))?;

    let plan_type = prompt(input, output, PLAN_PROMPT, "plan type")?;

    let result = evaluator.evaluate(&WithdrawalRequest {
        amount_usd,
        is_early,
        plan_type,
        residency: None,
    });
    write_report(&result, output)?;
    info!(amount_usd = %amount_usd, is_early, "interactive evaluation complete");
    Ok(result)
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    field: &'static str,
) -> Result<String, InteractiveError> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(InteractiveError::EndOfInput(field));
    }
    Ok(line.trim().to_string())
}

/// Writes the interactive report. "Tax to pay in USA" is the U.S. tax
/// expressed in INR and is labelled with the rupee symbol.
pub fn write_report<W: Write>(result: &TaxResult, out: &mut W) -> io::Result<()> {
    match &result.plan {
        PlanClassification::Recognized(PlanType::Traditional) => {
            writeln!(out, "You have chosen a traditional plan (401k/IRA).")?
        }
        PlanClassification::Recognized(PlanType::Roth) => {
            writeln!(out, "You have chosen a Roth plan (Roth 401k/Roth IRA).")?
        }
        PlanClassification::Unrecognized(raw) => writeln!(
            out,
            "Warning: unrecognized plan '{raw}'. Please enter one of '401k', 'IRA', \
             'Roth 401k', or 'Roth IRA'. Continuing without a plan classification."
        )?,
    }

    writeln!(
        out,
        "Estimated U.S. federal tax on {}: {}",
        format_usd(result.amount_usd),
        format_usd(result.us_tax_usd)
    )?;
    writeln!(
        out,
        "Amount in INR (at {} INR/USD): {}",
        result.exchange_rate.normalize(),
        format_inr(result.inr_amount)
    )?;
    writeln!(
        out,
        "Estimated Indian tax on {}: {}",
        format_inr(result.inr_amount),
        format_inr(result.india_tax_inr)
    )?;
    writeln!(
        out,
        "U.S. tax converted to INR: {}",
        format_inr(result.us_tax_in_inr)
    )?;

    match result.comparison {
        TaxComparison::UsHigher { by_inr } => {
            writeln!(out, "U.S. tax is higher by {}", format_inr(by_inr))?
        }
        TaxComparison::IndiaHigher { by_inr } => {
            writeln!(out, "Indian tax is higher by {}", format_inr(by_inr))?
        }
        TaxComparison::Equal => writeln!(out, "Both U.S. and Indian taxes are equal.")?,
    }

    writeln!(
        out,
        "Tax to pay in USA: {}",
        format_inr(result.allocation.usa_payable_inr)
    )?;
    writeln!(
        out,
        "Tax to pay in India: {}",
        format_inr(result.allocation.india_payable_inr)
    )?;

    if result.is_early {
        writeln!(
            out,
            "Since you are withdrawing before 59½, the penalty is: {}",
            format_usd(result.penalty_usd)
        )?;
    } else {
        writeln!(out, "No early withdrawal penalty.")?;
    }

    writeln!(
        out,
        "Total deductions (tax + penalty): {}",
        format_usd(result.total_deductions_usd)
    )?;
    writeln!(
        out,
        "Net amount you will receive: {}",
        format_usd(result.net_amount_usd)
    )
}

/// Tabulates the per-residency breakdown, one row per residency.
pub fn write_residency_table<W: Write>(result: &TaxResult, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:<9} {:>14} {:>16} {:>12} {:>16} {:>16}",
        "Residency", "U.S. tax", "India tax", "Penalty", "Total deducted", "Receivable"
    )?;
    for row in &result.residencies {
        writeln!(
            out,
            "{:<9} {:>14} {:>16} {:>12} {:>16} {:>16}",
            row.residency.code(),
            format_usd(row.usa_tax_usd),
            format_inr(row.india_tax_inr),
            format_usd(row.penalty_usd),
            format_usd(row.total_deducted_usd),
            format_usd(row.total_receivable_usd)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn run_with(stdin: &str) -> (Result<TaxResult, InteractiveError>, String) {
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = run(&Evaluator::default(), &mut input, &mut output);
        (result, String::from_utf8(output).expect("utf-8 output"))
    }

    #[test]
    fn yes_variants_are_accepted() {
        for raw in ["yes", "Y", " true ", "T", "1"] {
            assert!(parse_yes_no(raw), "{raw}");
        }
        for raw in ["no", "n", "", "0", "maybe"] {
            assert!(!parse_yes_no(raw), "{raw}");
        }
    }

    #[test]
    fn full_session_prints_each_figure() {
        let (result, output) = run_with("yes\n100000\nRoth IRA\n");
        let result = result.expect("session succeeds");

        assert_eq!(result.penalty_usd, dec!(10000));
        assert!(result.plan.is_roth());

        let expected_lines = [
            "Early withdrawal: yes",
            "You entered withdrawal amount: $100,000",
            "You have chosen a Roth plan (Roth 401k/Roth IRA).",
            "Estimated U.S. federal tax on $100,000: $16,914",
            "Amount in INR (at 87 INR/USD): ₹8,700,000",
            "Estimated Indian tax on ₹8,700,000: ₹2,300,000",
            "U.S. tax converted to INR: ₹1,471,518",
            "Indian tax is higher by ₹828,482",
            "Tax to pay in USA: ₹1,471,518",
            "Tax to pay in India: ₹828,482",
            "Since you are withdrawing before 59½, the penalty is: $10,000",
            "Total deductions (tax + penalty): $26,914",
            "Net amount you will receive: $73,086",
        ];
        for line in expected_lines {
            assert!(output.contains(line), "missing '{line}' in:\n{output}");
        }
    }

    #[test]
    fn unrecognized_plan_warns_but_completes() {
        let (result, output) = run_with("no\n5000\n403b\n");
        let result = result.expect("unrecognized plan is not fatal");

        assert_eq!(
            result.plan,
            PlanClassification::Unrecognized("403b".to_string())
        );
        assert!(output.contains("Warning: unrecognized plan '403b'"));
        assert!(output.contains("No early withdrawal penalty."));
        assert!(output.contains("U.S. tax is higher by"));
    }

    #[test]
    fn non_numeric_amount_aborts_the_run() {
        let (result, output) = run_with("yes\nlots\n401k\n");
        assert!(matches!(
            result,
            Err(InteractiveError::Input(TaxError::InvalidInput(_)))
        ));
        assert!(!output.contains("Net amount"));
    }

    #[test]
    fn closed_input_reports_missing_answer() {
        let (result, _) = run_with("no\n");
        assert!(matches!(result, Err(InteractiveError::EndOfInput("amount"))));
    }

    #[test]
    fn residency_table_lists_each_requested_residency() {
        let result = Evaluator::default().evaluate(&WithdrawalRequest {
            amount_usd: dec!(100000),
            is_early: false,
            plan_type: "IRA".to_string(),
            residency: None,
        });
        let mut out = Vec::new();
        write_residency_table(&result, &mut out).expect("write to vec");
        let table = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("NRI"));
        assert!(lines[1].contains("₹0.00"));
        assert!(lines[2].starts_with("RNOR"));
        assert!(lines[2].contains("₹2,300,000"));
        assert!(lines[3].starts_with("ROR"));
        assert!(!lines[3].contains("$83,086"));
        assert!(lines[1].contains("$83,086"));
    }
}
