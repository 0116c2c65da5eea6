//! Solution reports
//!
//! A report pairs the human-readable problem dump with every decision variable's solved
//! value, and is written as JSON or YAML depending on the output path's extension.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Report Errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output path does not end in a recognised extension.
    #[error("unsupported output format for `{}`, expected .json, .yml or .yaml", .0.display())]
    UnsupportedOutputFormat(PathBuf),

    /// Failed to write the output file.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialisation error
    #[error("failed to serialise report as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialisation error
    #[error("failed to serialise report as YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Supported report encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `.json`
    Json,

    /// `.yml` / `.yaml`
    Yaml,
}

impl OutputFormat {
    /// Pick the output format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnsupportedOutputFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(OutputFormat::Json),
            Some("yml" | "yaml") => Ok(OutputFormat::Yaml),
            _ => Err(ReportError::UnsupportedOutputFormat(path.to_path_buf())),
        }
    }
}

/// Serialisable dump of a solved problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Human-readable objective and constraints
    #[serde(rename = "Problem")]
    pub problem: String,

    /// Decision-variable name → solved value, in variable order
    #[serde(rename = "Solution", serialize_with = "ordered_map")]
    pub solution: Vec<(String, f64)>,
}

impl Report {
    /// Write the report to `path` in the format implied by its extension.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the extension is unsupported, or the file cannot be
    /// created or written.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let format = OutputFormat::from_path(path)?;
        let mut writer = BufWriter::new(File::create(path)?);

        self.write(&mut writer, format)?;
        writer.flush()?;

        Ok(())
    }

    /// Write the report to `writer` in `format`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if serialisation fails.
    pub fn write<W: Write>(&self, writer: W, format: OutputFormat) -> Result<(), ReportError> {
        match format {
            OutputFormat::Json => serde_json::to_writer_pretty(writer, self)?,
            OutputFormat::Yaml => serde_norway::to_writer(writer, self)?,
        }

        Ok(())
    }
}

fn ordered_map<S: Serializer>(entries: &[(String, f64)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(name, value)| (name, value)))
}
