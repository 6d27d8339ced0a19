#![crate_name = "mkhe"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Multi-key homomorphic encryption over RLWE.
//!
//! Ciphertexts encrypted under the keys of several independent parties can be
//! added, multiplied with relinearization, rotated and conjugated. The result
//! decrypts only with the secret keys of every party that contributed to it.

mod errors;

pub mod mkrlwe;
pub use errors::{Error, ParametersError, Result};
