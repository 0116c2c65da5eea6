//! Command-line configuration

use std::path::PathBuf;

use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    dataset::{Dataset, DatasetError, loader, random},
    report::{OutputFormat, ReportError},
    variants::Variant,
};

/// Allot configuration
#[derive(Debug, Parser)]
#[command(
    name = "allot",
    about = "Decide how many units to buy from each market by solving a MILP",
    long_about = None
)]
pub struct Config {
    /// Formulation to solve
    #[arg(long, value_enum, env = "ALLOT_VARIANT", default_value_t = Variant::Market)]
    pub variant: Variant,

    /// Path to a JSON or YAML dataset with a `Data` section
    #[arg(
        short,
        long,
        conflicts_with_all = ["rows", "cols"],
        required_unless_present_all = ["rows", "cols"]
    )]
    pub data: Option<PathBuf>,

    /// Number of markets in a randomly generated dataset
    #[arg(short, long, requires = "cols")]
    pub rows: Option<usize>,

    /// Number of products in a randomly generated dataset
    #[arg(short, long, requires = "rows")]
    pub cols: Option<usize>,

    /// Seed for the random dataset generator
    #[arg(short, long, requires = "rows")]
    pub seed: Option<u64>,

    /// Print the full problem before solving
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a report to this path (.json, .yml or .yaml)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Load from a file
    File(PathBuf),

    /// Generate with the given dimensions
    Random {
        /// Number of markets
        rows: usize,
        /// Number of products
        cols: usize,
        /// Optional generator seed
        seed: Option<u64>,
    },
}

impl Config {
    /// The dataset source selected on the command line.
    pub fn source(&self) -> DataSource {
        match (&self.data, self.rows, self.cols) {
            (Some(path), _, _) => DataSource::File(path.clone()),
            (None, rows, cols) => DataSource::Random {
                rows: rows.unwrap_or_default(),
                cols: cols.unwrap_or_default(),
                seed: self.seed,
            },
        }
    }

    /// Load or generate the dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if the file cannot be loaded.
    pub fn load_dataset(&self) -> Result<Dataset, DatasetError> {
        match self.source() {
            DataSource::File(path) => loader::load(path),
            DataSource::Random { rows, cols, seed } => {
                let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

                random::generate(self.variant, rows, cols, &mut rng)
            }
        }
    }

    /// Check the output path, if any, before any work is done.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnsupportedOutputFormat`] for an unrecognised extension.
    pub fn output_format(&self) -> Result<Option<OutputFormat>, ReportError> {
        self.output
            .as_deref()
            .map(OutputFormat::from_path)
            .transpose()
    }
}
