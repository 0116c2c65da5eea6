//! Allocations

use std::fmt;

/// Units of each product bought at each market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    markets: usize,
    products: usize,
    units: Vec<u64>,
    discount_modes: Option<Vec<bool>>,
}

impl Allocation {
    /// Wrap row-major unit counts for `markets` × `products` cells.
    ///
    /// Returns `None` if `units` does not hold exactly one value per cell.
    pub fn new(markets: usize, products: usize, units: Vec<u64>) -> Option<Self> {
        (units.len() == markets * products).then_some(Self {
            markets,
            products,
            units,
            discount_modes: None,
        })
    }

    /// Attach per-market discount-mode flags.
    #[must_use]
    pub fn with_discount_modes(mut self, modes: Vec<bool>) -> Self {
        self.discount_modes = Some(modes);
        self
    }

    /// Number of markets (rows)
    pub fn markets(&self) -> usize {
        self.markets
    }

    /// Number of products (columns)
    pub fn products(&self) -> usize {
        self.products
    }

    /// Units of `product` bought at `market`.
    pub fn get(&self, market: usize, product: usize) -> Option<u64> {
        if market >= self.markets || product >= self.products {
            return None;
        }

        self.units.get(market * self.products + product).copied()
    }

    /// One slice per market.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> + '_ {
        self.units.chunks(self.products.max(1)).take(self.markets)
    }

    /// Total units bought of `product` across markets.
    pub fn product_total(&self, product: usize) -> u64 {
        (0..self.markets)
            .filter_map(|market| self.get(market, product))
            .sum()
    }

    /// Whether each market operates in discount mode; only set by the discount variant.
    pub fn discount_modes(&self) -> Option<&[bool]> {
        self.discount_modes.as_deref()
    }
}

/// Space-separated grid, one line per market.
impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (market, row) in self.rows().enumerate() {
            if market > 0 {
                writeln!(f)?;
            }

            for (product, units) in row.iter().enumerate() {
                if product > 0 {
                    f.write_str(" ")?;
                }

                write!(f, "{units}")?;
            }
        }

        Ok(())
    }
}
