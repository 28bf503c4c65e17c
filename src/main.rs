use std::io::{self, Write};
use std::net::IpAddr;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nri_withdrawal::api;
use nri_withdrawal::config::ConfigArgs;
use nri_withdrawal::core::{Residency, WithdrawalRequest, parse_amount};
use nri_withdrawal::interactive;

/// Estimates U.S. and Indian tax on a 401k/IRA withdrawal.
#[derive(Parser, Debug)]
#[command(name = "nri-withdrawal", version, about)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prompt for the withdrawal on the terminal and print a report
    Interactive,

    /// Serve POST /api/withdrawal-calculation over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Evaluate a single withdrawal without prompting
    Calculate {
        /// Withdrawal amount in USD
        #[arg(long, value_parser = parse_amount_arg)]
        amount: Decimal,
        /// Withdrawal is taken before age 59½
        #[arg(long, default_value_t = false)]
        early: bool,
        /// 401k, IRA, Roth 401k or Roth IRA
        #[arg(long, default_value = "401k")]
        plan: String,
        /// Only report this residency status
        #[arg(long, value_enum, conflicts_with = "json")]
        residency: Option<CliResidency>,
        /// Print the HTTP response body instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliResidency {
    Nri,
    Rnor,
    Ror,
}

impl From<CliResidency> for Residency {
    fn from(value: CliResidency) -> Self {
        match value {
            CliResidency::Nri => Residency::Nri,
            CliResidency::Rnor => Residency::Rnor,
            CliResidency::Ror => Residency::Ror,
        }
    }
}

fn parse_amount_arg(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|e| e.to_string())
}

/// Logs go to stderr so report output on stdout stays clean.
/// Honours `RUST_LOG`, defaulting to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    let evaluator = config.evaluator()?;
    debug!(?config, "starting");

    match cli.command {
        Command::Interactive => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            interactive::run(&evaluator, &mut stdin.lock(), &mut stdout.lock())?;
        }
        Command::Serve { host, port } => {
            api::run_http_server(host, port, evaluator)
                .await
                .with_context(|| format!("HTTP server on {host}:{port} failed"))?;
        }
        Command::Calculate {
            amount,
            early,
            plan,
            residency,
            json,
        } => {
            let result = evaluator.evaluate(&WithdrawalRequest {
                amount_usd: amount,
                is_early: early,
                plan_type: plan,
                residency: residency.map(Residency::from),
            });
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if json {
                let body = api::calculation_response(&evaluator, &result);
                serde_json::to_writer_pretty(&mut out, &body)?;
                writeln!(out)?;
            } else {
                interactive::write_residency_table(&result, &mut out)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calculate_parses_amount_and_global_flags() {
        let cli = Cli::try_parse_from([
            "nri-withdrawal",
            "calculate",
            "--amount",
            "1,500",
            "--early",
            "--exchange-rate",
            "83",
        ])
        .expect("valid args");

        assert_eq!(cli.config.exchange_rate, Some(dec!(83)));
        match cli.command {
            Command::Calculate { amount, early, .. } => {
                assert_eq!(amount, dec!(1500));
                assert!(early);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn residency_and_json_are_mutually_exclusive() {
        let err = Cli::try_parse_from([
            "nri-withdrawal",
            "calculate",
            "--amount",
            "10",
            "--residency",
            "nri",
            "--json",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn serve_defaults_to_port_8080() {
        let cli = Cli::try_parse_from(["nri-withdrawal", "serve"]).expect("valid args");
        match cli.command {
            Command::Serve { port, .. } => assert_eq!(port, 8080),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_amount_is_rejected_at_parse_time() {
        assert!(
            Cli::try_parse_from(["nri-withdrawal", "calculate", "--amount", "-1"]).is_err()
        );
    }
}
