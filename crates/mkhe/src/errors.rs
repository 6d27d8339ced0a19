use thiserror::Error;

use crate::mkrlwe::{CrsSlot, KeyKind, PartyId};
use mkhe_math::rq::Representation;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Indicates that an error from the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    MathError(mkhe_math::Error),

    /// Indicates a configuration defect, such as operands built from
    /// different parameters.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indicates that the key of a party is absent from a key set.
    #[error("Missing {kind} key for party {party}")]
    MissingKey {
        /// The party whose key is missing.
        party: PartyId,
        /// The kind of key that is missing.
        kind: KeyKind,
    },

    /// Indicates that the level of an operand is lower than required.
    #[error("Level mismatch: expected at least {expected}, found {found}")]
    LevelMismatch {
        /// The level required by the operation.
        expected: usize,
        /// The level of the operand.
        found: usize,
    },

    /// Indicates that no common reference string was registered for a slot.
    #[error("No common reference string registered for {0}")]
    MissingCrs(CrsSlot),

    /// Indicates that a polynomial is not in the expected representation.
    #[error("Incorrect representation: expected {expected:?}, found {found:?}")]
    Representation {
        /// The representation required by the operation.
        expected: Representation,
        /// The representation of the polynomial.
        found: Representation,
    },

    /// Indicates that the reserved common identifier was used to name a party.
    #[error("The identifier {0:?} is reserved for the common component")]
    ReservedIdentifier(String),

    /// Indicates that an identifier does not name an enrolled party.
    #[error("Unknown party: {0}")]
    UnknownParty(String),

    /// Indicates that a ciphertext is inconsistent with its parameters.
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Indicates a parameter error.
    #[error("{0}")]
    ParametersError(ParametersError),

    /// Indicates a default error
    #[error("{0}")]
    DefaultError(String),
}

impl From<mkhe_util::SamplingError> for Error {
    fn from(e: mkhe_util::SamplingError) -> Self {
        Error::MathError(e.into())
    }
}

impl From<mkhe_math::Error> for Error {
    /// Representation errors of the mathematical library surface as
    /// [`Error::Representation`].
    fn from(e: mkhe_math::Error) -> Self {
        match e {
            mkhe_math::Error::IncorrectRepresentation(found, expected) => {
                Error::Representation { expected, found }
            }
            e => Error::MathError(e),
        }
    }
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 larger than 8")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that there exists not enough primes of this size.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that a modulus is not prime or does not support the NTT.
    #[error("Invalid modulus {0}: {1}")]
    InvalidModulus(u64, String),

    /// Indicates that a modulus appears twice across the Q and P chains.
    #[error("Duplicate modulus {0}")]
    DuplicateModulus(u64),

    /// Indicates that the digit size is invalid.
    #[error("Invalid digit size: {0}")]
    InvalidDigitSize(usize),

    /// Indicates that the noise standard deviation is invalid.
    #[error("Invalid standard deviation: {0}")]
    InvalidSigma(String),

    /// Indicates that the Hamming weight of sparse secrets is invalid.
    #[error("Invalid Hamming weight {0} for polynomials of degree {1}")]
    InvalidHammingWeight(usize, usize),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),
}

#[cfg(test)]
mod tests {
    use crate::mkrlwe::{CrsSlot, KeyKind, PartyId};
    use crate::{Error, ParametersError};
    use mkhe_math::rq::Representation;

    #[test]
    fn error_strings() {
        assert_eq!(
            Error::MathError(mkhe_math::Error::InvalidContext).to_string(),
            mkhe_math::Error::InvalidContext.to_string()
        );
        assert_eq!(
            Error::MissingKey {
                party: PartyId::new(3),
                kind: KeyKind::Secret
            }
            .to_string(),
            "Missing secret key for party #3"
        );
        assert_eq!(
            Error::LevelMismatch {
                expected: 2,
                found: 1
            }
            .to_string(),
            "Level mismatch: expected at least 2, found 1"
        );
        assert_eq!(
            Error::MissingCrs(CrsSlot::Rotation(5)).to_string(),
            "No common reference string registered for rotation 5"
        );
        assert_eq!(
            Error::ReservedIdentifier("0".to_string()).to_string(),
            "The identifier \"0\" is reserved for the common component"
        );
        assert_eq!(
            Error::ParametersError(ParametersError::InvalidDegree(10)).to_string(),
            ParametersError::InvalidDegree(10).to_string()
        );
    }

    #[test]
    fn representation_errors_are_mapped() {
        assert_eq!(
            Error::from(mkhe_math::Error::IncorrectRepresentation(
                Representation::PowerBasis,
                Representation::Ntt
            )),
            Error::Representation {
                expected: Representation::Ntt,
                found: Representation::PowerBasis
            }
        );
        assert_eq!(
            Error::from(mkhe_math::Error::InvalidContext),
            Error::MathError(mkhe_math::Error::InvalidContext)
        );
    }

    #[test]
    fn parameters_error_strings() {
        assert_eq!(
            ParametersError::InvalidDegree(10).to_string(),
            "Invalid degree: 10 is not a power of 2 larger than 8"
        );
        assert_eq!(
            ParametersError::InvalidModulusSize(1, 2, 3).to_string(),
            "Invalid modulus size: 1, expected an integer between 2 and 3"
        );
        assert_eq!(
            ParametersError::NotEnoughPrimes(1, 2).to_string(),
            "Not enough primes of size 1 for polynomials of degree 2"
        );
        assert_eq!(
            ParametersError::DuplicateModulus(17).to_string(),
            "Duplicate modulus 17"
        );
    }
}
