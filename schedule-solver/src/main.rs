use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use schedule_solver::{config, emitter, solver, AppError};

/// Solves a staff work schedule by exact-cover search.
#[derive(Parser, Debug)]
#[command(name = "schedule-solver", version, about)]
struct Cli {
    /// Path to the YAML schedule configuration.
    #[arg(long, default_value = "schedule.yaml")]
    input: PathBuf,

    /// Path the solved schedule is written to as CSV.
    #[arg(long, default_value = "solution.csv")]
    output: PathBuf,

    /// Increase log verbosity; repeat for more (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match std::panic::catch_unwind(AssertUnwindSafe(|| run(&cli.input, &cli.output))) {
        Ok(Ok(true)) => ExitCode::SUCCESS,
        Ok(Ok(false)) => {
            println!("no solution");
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            tracing::error!(error = %err, "schedule-solver failed");
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
        Err(_) => {
            eprintln!("internal error: an invariant was violated during search");
            ExitCode::from(2)
        }
    }
}

fn run(input: &Path, output: &Path) -> Result<bool, AppError> {
    let raw = config::load(input)?;
    let constraints = config::normalize(raw)?;
    tracing::info!(
        staff = constraints.staff.len(),
        periods = constraints.periods.len(),
        titles = constraints.titles.len(),
        days = constraints.days,
        "loaded configuration"
    );

    match solver::solve_on_dedicated_stack(&constraints) {
        Some(solution) => {
            emitter::write_solution(&constraints, &solution, output)?;
            tracing::info!(path = %output.display(), "wrote solution");
            Ok(true)
        }
        None => Ok(false),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
