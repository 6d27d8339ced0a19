#![crate_name = "mkhe_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the mkhe library.

#[cfg(test)]
#[macro_use]
extern crate proptest;

mod sampling;

pub use sampling::{
    sample_vec_cbd, sample_vec_gaussian, sample_vec_sparse_ternary, sample_vec_ternary,
    SamplingError,
};

use num_bigint_dig::{prime::probably_prime, BigUint};

/// Returns whether the modulus p is prime; this function is 100% accurate.
pub fn is_prime(p: u64) -> bool {
    probably_prime(&BigUint::from(p), 0)
}

/// Returns the ceil of a divided by b.
///
/// Panics when `b` is 0.
pub const fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
