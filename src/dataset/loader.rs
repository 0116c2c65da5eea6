//! Dataset loading
//!
//! Input documents carry a `Data` section mapping attribute keys to numeric arrays:
//!
//! ```json
//! { "Data": { "p": [[2, 3]], "q": [[1, 1]], "d": [1, 1], "t": [5] } }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::dataset::{Dataset, DatasetError, Matrix};

/// Supported input document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `.json`
    Json,

    /// `.yml` / `.yaml`
    Yaml,
}

impl InputFormat {
    /// Pick the input format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnsupportedInputFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("yml" | "yaml") => Ok(InputFormat::Yaml),
            _ => Err(DatasetError::UnsupportedInputFormat(
                path.display().to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataDocument {
    #[serde(rename = "Data")]
    data: Option<BTreeMap<String, RawArray>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArray {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

/// Load a dataset from a JSON or YAML file.
///
/// # Errors
///
/// Returns a [`DatasetError`] if the file cannot be read or parsed, has no `Data`
/// section, or contains a ragged matrix.
pub fn load(path: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;

    load_str(&contents, format)
}

/// Load a dataset from an in-memory document.
///
/// # Errors
///
/// Returns a [`DatasetError`] if the document cannot be parsed, has no `Data`
/// section, or contains a ragged matrix.
pub fn load_str(contents: &str, format: InputFormat) -> Result<Dataset, DatasetError> {
    let document: DataDocument = match format {
        InputFormat::Json => serde_json::from_str(contents)?,
        InputFormat::Yaml => serde_norway::from_str(contents)?,
    };

    let data = document.data.ok_or(DatasetError::MissingDataSection)?;
    let mut builder = Dataset::builder();

    for (name, raw) in data {
        match raw {
            RawArray::Vector(values) => {
                builder.insert(name, values)?;
            }
            RawArray::Matrix(rows) => {
                let matrix = Matrix::from_rows(&name, rows)?;
                builder.insert(name, matrix)?;
            }
        }
    }

    Ok(builder.build())
}
