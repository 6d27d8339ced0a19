#![crate_name = "mkhe_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Mathematical utilities for the mkhe library: modular arithmetic, the
//! Number-Theoretic Transform, residue number systems and polynomial rings.

mod errors;

pub mod ntt;
pub mod rns;
pub mod rq;
pub mod zq;

pub use errors::{Error, Result};

#[cfg(test)]
#[macro_use]
extern crate proptest;
