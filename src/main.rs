//! Allot command-line entry point

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use allot::{
    allocator::{AllocationObserver, Allocator},
    config::Config,
    formulations::model::Problem,
    solvers::milp::MilpBackend,
};

/// Prints the formulated problem when `--verbose` is set.
#[derive(Debug)]
struct ProblemPrinter {
    enabled: bool,
}

impl AllocationObserver for ProblemPrinter {
    #[expect(clippy::print_stdout, reason = "verbose mode dumps the problem to stdout")]
    fn on_problem(&mut self, problem: &Problem) {
        if self.enabled {
            println!("{problem}");
        }
    }
}

#[expect(clippy::print_stdout, reason = "the allocation is the program's output")]
fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Reject an unusable output path before spending time on the solve.
    config.output_format()?;

    let dataset = config
        .load_dataset()
        .with_context(|| format!("failed to prepare {} dataset", config.variant))?;

    let allocator = Allocator::new(MilpBackend);
    let mut printer = ProblemPrinter {
        enabled: config.verbose,
    };

    let start = Instant::now();
    let solved = allocator.solve_with_observer(config.variant, &dataset, &mut printer)?;

    info!(elapsed = ?start.elapsed(), "solve finished");

    print!("{}", solved.render());
    println!("Objective: {}", solved.objective());

    if let Some(path) = &config.output {
        solved
            .report()
            .write_to_path(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;

        info!(path = %path.display(), "report written");
    }

    Ok(())
}
