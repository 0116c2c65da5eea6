//! Dataset validation
//!
//! Checks a [`Dataset`] against the requirements of a [`Variant`] and, on success, hands
//! back typed [`Inputs`] that formulations read from. Checks stop at the first failure.

use thiserror::Error;

use crate::{
    dataset::{Array, Attribute, Dataset, Matrix},
    variants::Variant,
};

/// Validation Errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required attribute is absent from the dataset.
    #[error("missing required attribute {0}")]
    MissingAttribute(Attribute),

    /// An attribute that must be two-dimensional is a vector.
    #[error("attribute {0} must be a matrix")]
    ExpectedMatrix(Attribute),

    /// An attribute that must be one-dimensional is a matrix.
    #[error("attribute {0} must be a vector")]
    ExpectedVector(Attribute),

    /// The price matrix has no markets or no products.
    #[error("prices must have at least one market and one product, found {rows}x{cols}")]
    EmptyPrices {
        /// Number of markets
        rows: usize,
        /// Number of products
        cols: usize,
    },

    /// Prices and quantities differ in shape.
    #[error("prices shape {prices:?} does not match quantities shape {quantities:?}")]
    ShapeMismatch {
        /// `(rows, cols)` of prices
        prices: (usize, usize),
        /// `(rows, cols)` of quantities
        quantities: (usize, usize),
    },

    /// Demand length differs from the number of products.
    #[error("demand has {found} entries, expected one per product ({expected})")]
    DemandLength {
        /// Number of products
        expected: usize,
        /// Length of demand
        found: usize,
    },

    /// Limit length differs from the number of markets.
    #[error("limit has {found} entries, expected one per market ({expected})")]
    LimitLength {
        /// Number of markets
        expected: usize,
        /// Length of limit
        found: usize,
    },

    /// An entry is NaN or infinite.
    #[error("attribute {attribute} has a non-finite entry at index {index}")]
    NonFinite {
        /// Offending attribute
        attribute: Attribute,
        /// Row-major index of the entry
        index: usize,
    },

    /// An entry is zero or negative where positivity is required.
    #[error("attribute {attribute} must be strictly positive, found {value} at index {index}")]
    NonPositive {
        /// Offending attribute
        attribute: Attribute,
        /// Row-major index of the entry
        index: usize,
        /// Offending value
        value: f64,
    },

    /// A discount rate is not below one.
    #[error("discount rate for market {market} must be below 1, found {value}")]
    DiscountOutOfRange {
        /// Market index (0-based)
        market: usize,
        /// Offending rate
        value: f64,
    },
}

/// Validated, typed view over a dataset.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    prices: &'a Matrix,
    quantities: &'a Matrix,
    demand: &'a [f64],
    limit: &'a [f64],
}

impl<'a> Inputs<'a> {
    /// n×m unit prices
    pub fn prices(&self) -> &'a Matrix {
        self.prices
    }

    /// n×m available quantities
    pub fn quantities(&self) -> &'a Matrix {
        self.quantities
    }

    /// Required units per product
    pub fn demand(&self) -> &'a [f64] {
        self.demand
    }

    /// Per-market capacity
    pub fn limit(&self) -> &'a [f64] {
        self.limit
    }

    /// Per-market discount rate; the discount variant stores these under the limit key.
    pub fn discounts(&self) -> &'a [f64] {
        self.limit
    }

    /// Number of markets (n)
    pub fn markets(&self) -> usize {
        self.prices.rows()
    }

    /// Number of product types (m)
    pub fn products(&self) -> usize {
        self.prices.cols()
    }
}

/// Validate `dataset` for `variant`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(dataset: &Dataset, variant: Variant) -> Result<Inputs<'_>, ValidationError> {
    for attribute in Attribute::ALL {
        if dataset.attribute(attribute).is_none() {
            return Err(ValidationError::MissingAttribute(attribute));
        }
    }

    let inputs = Inputs {
        prices: matrix(dataset, Attribute::Prices)?,
        quantities: matrix(dataset, Attribute::Quantities)?,
        demand: vector(dataset, Attribute::Demand)?,
        limit: vector(dataset, Attribute::Limit)?,
    };

    check_shapes(&inputs)?;

    for (attribute, values) in attribute_values(&inputs) {
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(ValidationError::NonFinite { attribute, index });
        }
    }

    if variant.requires_positive_inputs() {
        for (attribute, values) in attribute_values(&inputs) {
            if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
                return Err(ValidationError::NonPositive {
                    attribute,
                    index,
                    value,
                });
            }
        }
    }

    if variant == Variant::Discount
        && let Some((market, &value)) = inputs
            .discounts()
            .iter()
            .enumerate()
            .find(|(_, rate)| **rate >= 1.0)
    {
        return Err(ValidationError::DiscountOutOfRange { market, value });
    }

    Ok(inputs)
}

fn check_shapes(inputs: &Inputs<'_>) -> Result<(), ValidationError> {
    let (rows, cols) = inputs.prices.shape();

    if rows == 0 || cols == 0 {
        return Err(ValidationError::EmptyPrices { rows, cols });
    }

    if inputs.quantities.shape() != (rows, cols) {
        return Err(ValidationError::ShapeMismatch {
            prices: (rows, cols),
            quantities: inputs.quantities.shape(),
        });
    }

    if inputs.demand.len() != cols {
        return Err(ValidationError::DemandLength {
            expected: cols,
            found: inputs.demand.len(),
        });
    }

    if inputs.limit.len() != rows {
        return Err(ValidationError::LimitLength {
            expected: rows,
            found: inputs.limit.len(),
        });
    }

    Ok(())
}

fn attribute_values<'a>(inputs: &Inputs<'a>) -> [(Attribute, &'a [f64]); 4] {
    [
        (Attribute::Prices, inputs.prices.values()),
        (Attribute::Quantities, inputs.quantities.values()),
        (Attribute::Demand, inputs.demand),
        (Attribute::Limit, inputs.limit),
    ]
}

fn matrix(dataset: &Dataset, attribute: Attribute) -> Result<&Matrix, ValidationError> {
    match dataset.attribute(attribute) {
        Some(Array::Matrix(matrix)) => Ok(matrix),
        Some(Array::Vector(_)) => Err(ValidationError::ExpectedMatrix(attribute)),
        None => Err(ValidationError::MissingAttribute(attribute)),
    }
}

fn vector(dataset: &Dataset, attribute: Attribute) -> Result<&[f64], ValidationError> {
    match dataset.attribute(attribute) {
        Some(Array::Vector(values)) => Ok(values),
        Some(Array::Matrix(_)) => Err(ValidationError::ExpectedVector(attribute)),
        None => Err(ValidationError::MissingAttribute(attribute)),
    }
}
