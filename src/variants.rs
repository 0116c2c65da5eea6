//! Problem variants

use std::fmt;

use clap::ValueEnum;

/// The closed set of allocation formulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Variant {
    /// Minimise spend under per-market capacity with demand as a lower bound.
    Market,

    /// Market allocation over strictly positive inputs, reported as a grid.
    Quantity,

    /// Per-market choice between standard and discounted pricing with exact demand.
    Discount,
}

/// How the allocation is printed once solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// One `name = value` line per decision variable
    NamedValues,

    /// Space-separated grid, one row per market
    Grid,
}

impl Variant {
    /// Every variant.
    pub const ALL: [Variant; 3] = [Variant::Market, Variant::Quantity, Variant::Discount];

    /// Lowercase variant name.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Market => "market",
            Variant::Quantity => "quantity",
            Variant::Discount => "discount",
        }
    }

    /// Whether every input array must be strictly positive.
    pub fn requires_positive_inputs(self) -> bool {
        matches!(self, Variant::Quantity | Variant::Discount)
    }

    /// How solved allocations of this variant are printed.
    pub fn output_style(self) -> OutputStyle {
        match self {
            Variant::Market => OutputStyle::NamedValues,
            Variant::Quantity | Variant::Discount => OutputStyle::Grid,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
