//! Synthetic datasets

use rand::{Rng, distributions::Open01};

use crate::{
    dataset::{Attribute, Dataset, DatasetError, Matrix},
    variants::Variant,
};

/// Upper bound (exclusive) of generated prices.
const MAX_PRICE: f64 = 10.0;

/// Range of generated integer quantities, demands and limits.
const INTEGER_RANGE: std::ops::Range<u32> = 1..10;

/// Generate a random dataset with `rows` markets and `cols` products.
///
/// Every generated value is strictly positive, so the result passes validation for
/// every variant whenever `rows` and `cols` are non-zero.
///
/// # Errors
///
/// Returns a [`DatasetError`] if the dataset cannot be assembled.
pub fn generate<R: Rng + ?Sized>(
    variant: Variant,
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Result<Dataset, DatasetError> {
    let prices = random_matrix(Attribute::Prices, rows, cols, || {
        MAX_PRICE * rng.sample::<f64, _>(Open01)
    })?;

    let quantities = random_matrix(Attribute::Quantities, rows, cols, || {
        f64::from(rng.gen_range(INTEGER_RANGE))
    })?;

    let demand: Vec<f64> = (0..cols)
        .map(|_| f64::from(rng.gen_range(INTEGER_RANGE)))
        .collect();

    let limit: Vec<f64> = match variant {
        Variant::Market | Variant::Quantity => (0..rows)
            .map(|_| f64::from(rng.gen_range(INTEGER_RANGE)))
            .collect(),
        Variant::Discount => (0..rows).map(|_| rng.sample::<f64, _>(Open01)).collect(),
    };

    let mut builder = Dataset::builder();

    builder
        .set(Attribute::Prices, prices)?
        .set(Attribute::Quantities, quantities)?
        .set(Attribute::Demand, demand)?
        .set(Attribute::Limit, limit)?;

    Ok(builder.build())
}

fn random_matrix(
    attribute: Attribute,
    rows: usize,
    cols: usize,
    mut sample: impl FnMut() -> f64,
) -> Result<Matrix, DatasetError> {
    let values = (0..rows)
        .map(|_| (0..cols).map(|_| sample()).collect())
        .collect();

    Matrix::from_rows(attribute.key(), values)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use testresult::TestResult;

    use crate::{dataset::Array, validation::validate};

    use super::*;

    #[test]
    fn generated_datasets_validate_for_every_variant() -> TestResult {
        let mut rng = StdRng::seed_from_u64(7);

        for variant in Variant::ALL {
            let dataset = generate(variant, 4, 3, &mut rng)?;
            let inputs = validate(&dataset, variant)?;

            assert_eq!(inputs.prices().shape(), (4, 3));
            assert_eq!(inputs.demand().len(), 3);
            assert_eq!(inputs.limit().len(), 4);
        }

        Ok(())
    }

    #[test]
    fn integer_attributes_are_whole_numbers_in_range() -> TestResult {
        let mut rng = StdRng::seed_from_u64(11);
        let dataset = generate(Variant::Quantity, 5, 5, &mut rng)?;

        for attribute in [Attribute::Quantities, Attribute::Demand, Attribute::Limit] {
            let values = dataset
                .attribute(attribute)
                .map(Array::values)
                .ok_or("attribute missing")?;

            for &value in values {
                assert!((1.0..10.0).contains(&value), "{attribute} out of range");
                assert!((value - value.round()).abs() < f64::EPSILON);
            }
        }

        Ok(())
    }

    #[test]
    fn discount_rates_lie_strictly_between_zero_and_one() -> TestResult {
        let mut rng = StdRng::seed_from_u64(3);
        let dataset = generate(Variant::Discount, 6, 2, &mut rng)?;

        let rates = dataset
            .attribute(Attribute::Limit)
            .map(Array::values)
            .ok_or("discounts missing")?;

        assert_eq!(rates.len(), 6);
        assert!(rates.iter().all(|&rate| rate > 0.0 && rate < 1.0));

        Ok(())
    }

    #[test]
    fn same_seed_generates_same_dataset() -> TestResult {
        let first = generate(Variant::Market, 3, 3, &mut StdRng::seed_from_u64(42))?;
        let second = generate(Variant::Market, 3, 3, &mut StdRng::seed_from_u64(42))?;

        for attribute in Attribute::ALL {
            assert_eq!(first.attribute(attribute), second.attribute(attribute));
        }

        Ok(())
    }
}
