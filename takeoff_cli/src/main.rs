//! # takeoff CLI
//!
//! Runs the quantity takeoff engine over a project snapshot file and prints
//! the bill of quantities.
//!
//! ```text
//! takeoff project.json                      # summarized BOQ as text
//! takeoff project.json --view detailed -f   # every line with its formula
//! takeoff project.json --json --out run.json
//! takeoff --formulas                        # formula reference (Markdown)
//! ```
//!
//! Logging goes to stderr through `tracing`; `RUST_LOG` overrides `--verbose`.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use takeoff_core::catalog::InMemoryCatalog;
use takeoff_core::classification::ReportView;
use takeoff_core::errors::{CalcError, CalcResult};
use takeoff_core::file_io::{load_snapshot, save_run};
use takeoff_core::formulas::generate_formulas_markdown;
use takeoff_core::run::run_calculation;
use takeoff_core::trace::{TracingSink, NOOP_TRACE};

/// Report layout.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum View {
    /// Every takeoff line
    Detailed,
    /// Lines summed per pay item, template and level (default)
    #[default]
    Summarized,
}

impl From<View> for ReportView {
    fn from(view: View) -> Self {
        match view {
            View::Detailed => ReportView::Detailed,
            View::Summarized => ReportView::Summarized,
        }
    }
}

/// Compute a DPWH bill of quantities from a project snapshot.
#[derive(Parser, Debug)]
#[command(name = "takeoff")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project snapshot (JSON)
    #[arg(required_unless_present = "formulas")]
    snapshot: Option<PathBuf>,

    /// Report layout
    #[arg(long, value_enum, default_value_t = View::default())]
    view: View,

    /// Print the report as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Also write the full calc run (lines, summary, warnings) to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Show formula text and assumptions under each line (detailed view)
    #[arg(short = 'f', long = "show-formulas", action = ArgAction::SetTrue)]
    show_formulas: bool,

    /// Print the formula reference as Markdown and exit
    #[arg(long, action = ArgAction::SetTrue)]
    formulas: bool,

    /// Log every resolved label and computed quantity
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "takeoff_core=trace,takeoff=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// One-line error report with the stable error code.
fn error_line(e: &CalcError) -> String {
    format!("Error [{}]: {}", e.error_code(), e)
}

fn run(args: &Args) -> CalcResult<()> {
    let Some(path) = args.snapshot.as_deref() else {
        return Err(CalcError::invalid_input("snapshot", "", "A snapshot path is required"));
    };

    let snapshot = load_snapshot(path)?;
    tracing::info!(
        path = %path.display(),
        items = snapshot.item_count(),
        "Loaded snapshot"
    );

    let catalog = InMemoryCatalog::dpwh_defaults();
    let calc = if args.verbose {
        run_calculation(&snapshot, &catalog, &TracingSink)?
    } else {
        run_calculation(&snapshot, &catalog, &NOOP_TRACE)?
    };
    tracing::info!(
        run_id = %calc.meta.run_id,
        lines = calc.summary.line_count,
        warnings = calc.warnings.len(),
        "Calculation complete"
    );
    for warning in &calc.warnings {
        tracing::warn!("{}", warning);
    }

    if let Some(out) = args.out.as_deref() {
        save_run(&calc, out)?;
        tracing::info!(path = %out.display(), "Saved calc run");
    }

    let report = calc.report(args.view.into(), &catalog);
    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })?;
        println!("{}", json);
    } else {
        print!("{}", render::render_text(&calc, &report, args.show_formulas));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.formulas {
        print!("{}", generate_formulas_markdown());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}
