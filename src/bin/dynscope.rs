#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use dynscope::cli::args::{CliArgs, Command, OutputFormat};
use dynscope::cli::program::{ResolveProgram, ResolveReport};
use dynscope::cli::reporter::Reporter;
use dynscope::cli::script::{DispatchScript, StepOutcome};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if DYNSCOPE_LOG or RUST_LOG is set (zero cost otherwise).
    dynscope::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = !args.no_color && std::io::stdout().is_terminal();
    let reporter = Reporter::new(color);

    let status = match &args.command {
        Command::Resolve { path } => {
            let report = ResolveProgram::load(path)?.run()?;
            print_resolve(&report, args.format, &reporter)?;
            if report.has_errors() {
                EXIT_DIAGNOSTICS
            } else {
                EXIT_SUCCESS
            }
        }
        Command::Dispatch { path } => {
            let outcomes = DispatchScript::load(path)?.run()?;
            print_dispatch(&outcomes, args.format)?;
            EXIT_SUCCESS
        }
    };

    std::process::exit(status);
}

fn print_resolve(report: &ResolveReport, format: OutputFormat, reporter: &Reporter) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).context("failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for outcome in &report.outcomes {
                match (&outcome.resolved, outcome.code) {
                    (Some(resolved), _) => println!("{} -> {resolved}", outcome.query),
                    (None, Some(code)) => println!("{} -> AS{code:04}", outcome.query),
                    (None, None) => println!("{} -> unresolved", outcome.query),
                }
            }
            for forward in &report.forward_uses {
                println!("forward use: {forward}");
            }
            if !report.diagnostics.is_empty() {
                eprintln!("{}", reporter.render(&report.diagnostics));
            }
        }
    }
    Ok(())
}

fn print_dispatch(outcomes: &[StepOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(outcomes).context("failed to serialize outcomes")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for (index, outcome) in outcomes.iter().enumerate() {
                match &outcome.result {
                    Ok(value) => println!("{index}: {:?} -> {value}", outcome.op),
                    Err(err) => println!("{index}: {:?} !! {err}", outcome.op),
                }
            }
        }
    }
    Ok(())
}
