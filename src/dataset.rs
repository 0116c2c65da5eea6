//! Dataset
//!
//! An immutable bag of named numeric arrays. Arrays are inserted once through a
//! [`DatasetBuilder`] and then frozen into a [`Dataset`]; a name can never be reassigned.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

pub mod loader;
pub mod random;

/// Dataset Errors
#[derive(Debug, Error)]
pub enum DatasetError {
    /// An attribute was assigned more than once.
    #[error("attribute `{0}` is already set and cannot be modified")]
    AlreadySet(String),

    /// A nested array did not have the same length on every row.
    #[error("attribute `{name}` is ragged: row {row} has {found} entries, expected {expected}")]
    RaggedMatrix {
        /// Attribute name
        name: String,
        /// Row index of the offending row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        found: usize,
    },

    /// The input document has no `Data` section.
    #[error("input document has no `Data` section")]
    MissingDataSection,

    /// The input path has an extension the loader does not understand.
    #[error("unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    /// IO error reading the input file
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// The four attributes every formulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Per-market, per-product unit prices (`p`, n×m)
    Prices,

    /// Per-market, per-product available quantities (`q`, n×m)
    Quantities,

    /// Required units per product (`d`, length m)
    Demand,

    /// Per-market capacity, or per-market discount rate in the discount variant (`t`, length n)
    Limit,
}

impl Attribute {
    /// All attributes in validation order.
    pub const ALL: [Attribute; 4] = [
        Attribute::Prices,
        Attribute::Quantities,
        Attribute::Demand,
        Attribute::Limit,
    ];

    /// Key of the attribute in the input document.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Prices => "p",
            Attribute::Quantities => "q",
            Attribute::Demand => "d",
            Attribute::Limit => "t",
        }
    }

    /// Human-readable attribute name.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Prices => "prices",
            Attribute::Quantities => "quantities",
            Attribute::Demand => "demand",
            Attribute::Limit => "limit",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (`{}`)", self.name(), self.key())
    }
}

/// Dense row-major matrix of reals.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from nested rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::RaggedMatrix`] if the rows differ in length.
    pub fn from_rows(name: &str, rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * cols);

        for (row, entries) in rows.iter().enumerate() {
            if entries.len() != cols {
                return Err(DatasetError::RaggedMatrix {
                    name: name.to_string(),
                    row,
                    expected: cols,
                    found: entries.len(),
                });
            }

            values.extend_from_slice(entries);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            values,
        })
    }

    /// Number of rows (markets).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (products).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }

        self.values.get(row * self.cols + col).copied()
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A named numeric array.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// One-dimensional array
    Vector(Vec<f64>),

    /// Two-dimensional array
    Matrix(Matrix),
}

impl Array {
    /// Values in storage order, regardless of dimensionality.
    pub fn values(&self) -> &[f64] {
        match self {
            Array::Vector(values) => values,
            Array::Matrix(matrix) => matrix.values(),
        }
    }
}

impl From<Vec<f64>> for Array {
    fn from(values: Vec<f64>) -> Self {
        Array::Vector(values)
    }
}

impl From<Matrix> for Array {
    fn from(matrix: Matrix) -> Self {
        Array::Matrix(matrix)
    }
}

/// Write-once assembler for a [`Dataset`].
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    arrays: FxHashMap<String, Array>,
}

impl DatasetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named array.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::AlreadySet`] if `name` was set before.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        array: impl Into<Array>,
    ) -> Result<&mut Self, DatasetError> {
        let name = name.into();

        if self.arrays.contains_key(&name) {
            return Err(DatasetError::AlreadySet(name));
        }

        self.arrays.insert(name, array.into());

        Ok(self)
    }

    /// Set one of the well-known attributes under its document key.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::AlreadySet`] if the attribute was set before.
    pub fn set(
        &mut self,
        attribute: Attribute,
        array: impl Into<Array>,
    ) -> Result<&mut Self, DatasetError> {
        self.insert(attribute.key(), array)
    }

    /// Freeze the builder.
    pub fn build(self) -> Dataset {
        Dataset {
            arrays: self.arrays,
        }
    }
}

/// Frozen dataset; read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    arrays: FxHashMap<String, Array>,
}

impl Dataset {
    /// Start assembling a dataset.
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    /// Look up an array by name.
    pub fn get(&self, name: &str) -> Option<&Array> {
        self.arrays.get(name)
    }

    /// Look up one of the well-known attributes.
    pub fn attribute(&self, attribute: Attribute) -> Option<&Array> {
        self.get(attribute.key())
    }

    /// Number of named arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Whether no arrays were set.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn builder_rejects_second_assignment() -> TestResult {
        let mut builder = Dataset::builder();
        builder.set(Attribute::Demand, vec![1.0, 2.0])?;

        let err = builder.set(Attribute::Demand, vec![3.0]).err();

        assert!(matches!(err, Some(DatasetError::AlreadySet(name)) if name == "d"));

        Ok(())
    }

    #[test]
    fn first_assignment_survives_rejected_overwrite() -> TestResult {
        let mut builder = Dataset::builder();
        builder.insert("d", vec![1.0])?;

        assert!(builder.insert("d", vec![9.0]).is_err());

        let dataset = builder.build();

        assert_eq!(dataset.get("d"), Some(&Array::Vector(vec![1.0])));

        Ok(())
    }

    #[test]
    fn matrix_from_rows_is_row_major() -> TestResult {
        let matrix = Matrix::from_rows("p", vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;

        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.get(1, 0), Some(4.0));
        assert_eq!(matrix.get(0, 2), Some(3.0));
        assert_eq!(matrix.get(2, 0), None);
        assert_eq!(matrix.get(0, 3), None);

        Ok(())
    }

    #[test]
    fn matrix_from_ragged_rows_fails() {
        let err = Matrix::from_rows("q", vec![vec![1.0, 2.0], vec![3.0]]).err();

        assert!(matches!(
            err,
            Some(DatasetError::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn attribute_display_includes_key() {
        assert_eq!(Attribute::Limit.to_string(), "limit (`t`)");
    }
}
