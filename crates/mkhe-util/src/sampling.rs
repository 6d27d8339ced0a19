//! Samplers for small polynomials coefficients.

use itertools::Itertools;
use rand::{seq::index::sample, CryptoRng, Rng, RngCore};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Errors returned by the samplers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplingError {
    /// The variance of a centered binomial distribution is out of range.
    #[error("The variance should be between 1 and 16, found {0}")]
    Variance(usize),

    /// The Hamming weight of a sparse vector exceeds its size.
    #[error("The Hamming weight {weight} exceeds the vector size {size}")]
    HammingWeight {
        /// Requested number of non-zero coefficients.
        weight: usize,
        /// Size of the vector.
        size: usize,
    },

    /// The standard deviation is not a finite positive number.
    #[error("Invalid standard deviation {0}")]
    StandardDeviation(String),
}

/// Sample a vector of independent centered binomial distributions of a given
/// variance. Returns an error if the variance is strictly larger than 16.
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: usize,
    rng: &mut R,
) -> Result<Vec<i64>, SamplingError> {
    if !(1..=16).contains(&variance) {
        return Err(SamplingError::Variance(variance));
    }

    let mut out = Vec::with_capacity(vector_size);

    let number_bits = 4 * variance;
    let mask_add = ((u64::MAX >> (64 - number_bits)) >> (2 * variance)) as u128;
    let mask_sub = mask_add << (2 * variance);

    let mut current_pool = 0u128;
    let mut current_pool_nbits = 0;

    for _ in 0..vector_size {
        if current_pool_nbits < number_bits {
            current_pool |= (rng.next_u64() as u128) << current_pool_nbits;
            current_pool_nbits += 64;
        }
        out.push(
            ((current_pool & mask_add).count_ones() as i64)
                - ((current_pool & mask_sub).count_ones() as i64),
        );
        current_pool >>= number_bits;
        current_pool_nbits -= number_bits;
    }

    Ok(out)
}

/// Sample a vector with coefficients uniform in {-1, 0, 1}.
pub fn sample_vec_ternary<R: RngCore + CryptoRng>(vector_size: usize, rng: &mut R) -> Vec<i64> {
    (0..vector_size)
        .map(|_| rng.gen_range(-1i64..=1))
        .collect_vec()
}

/// Sample a vector in {-1, 0, 1} with exactly `hamming_weight` non-zero
/// coefficients, each of uniformly random sign.
pub fn sample_vec_sparse_ternary<R: RngCore + CryptoRng>(
    vector_size: usize,
    hamming_weight: usize,
    rng: &mut R,
) -> Result<Vec<i64>, SamplingError> {
    if hamming_weight > vector_size {
        return Err(SamplingError::HammingWeight {
            weight: hamming_weight,
            size: vector_size,
        });
    }

    let mut out = vec![0i64; vector_size];
    for i in sample(rng, vector_size, hamming_weight).into_iter() {
        out[i] = if rng.gen::<bool>() { 1 } else { -1 };
    }
    Ok(out)
}

/// Sample a vector from a rounded Gaussian distribution of standard deviation
/// `sigma`, rejecting samples larger than `6 * sigma` in absolute value.
pub fn sample_vec_gaussian<R: RngCore + CryptoRng>(
    vector_size: usize,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<i64>, SamplingError> {
    let normal = Normal::new(0.0, sigma)
        .ok()
        .filter(|_| sigma.is_finite() && sigma > 0.0)
        .ok_or_else(|| SamplingError::StandardDeviation(sigma.to_string()))?;
    let bound = (6.0 * sigma).ceil();

    let mut out = Vec::with_capacity(vector_size);
    while out.len() < vector_size {
        let x: f64 = normal.sample(rng).round();
        if x.abs() <= bound {
            out.push(x as i64);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn cbd() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        assert!(sample_vec_cbd(10, 0, &mut rng).is_err());
        assert!(sample_vec_cbd(10, 17, &mut rng).is_err());

        for var in 1..=16 {
            let v = sample_vec_cbd(1000, var, &mut rng)?;
            assert_eq!(v.len(), 1000);
            assert!(v.iter().all(|vi| vi.unsigned_abs() <= 2 * var as u64));
        }
        Ok(())
    }

    #[test]
    fn ternary() {
        let mut rng = thread_rng();
        let v = sample_vec_ternary(1000, &mut rng);
        assert_eq!(v.len(), 1000);
        assert!(v.iter().all(|vi| (-1..=1).contains(vi)));
        assert!(v.iter().any(|vi| *vi != 0));
    }

    #[test]
    fn sparse_ternary() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        assert_eq!(
            sample_vec_sparse_ternary(8, 9, &mut rng),
            Err(SamplingError::HammingWeight { weight: 9, size: 8 })
        );

        for h in [0, 1, 16, 64] {
            let v = sample_vec_sparse_ternary(64, h, &mut rng)?;
            assert_eq!(v.iter().filter(|vi| **vi != 0).count(), h);
            assert!(v.iter().all(|vi| (-1..=1).contains(vi)));
        }
        Ok(())
    }

    #[test]
    fn gaussian() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        assert!(sample_vec_gaussian(8, 0.0, &mut rng).is_err());
        assert!(sample_vec_gaussian(8, -1.0, &mut rng).is_err());
        assert!(sample_vec_gaussian(8, f64::NAN, &mut rng).is_err());

        let v = sample_vec_gaussian(10000, 3.2, &mut rng)?;
        assert!(v.iter().all(|vi| vi.unsigned_abs() <= 20));
        let mean = v.iter().sum::<i64>() as f64 / v.len() as f64;
        assert!(mean.abs() < 0.5);
        Ok(())
    }
}
