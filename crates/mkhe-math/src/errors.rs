use thiserror::Error;

use crate::rq::Representation;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Indicates an invalid modulus
    #[error("Invalid modulus: modulus {0} should be between 2 and (1 << 62) - 1.")]
    InvalidModulus(u64),

    /// Indicates that the provided context is invalid.
    #[error("Invalid context provided.")]
    InvalidContext,

    /// Indicates that there is no context at the requested level.
    #[error("No context at level {0} in this chain.")]
    NoSuchLevel(usize),

    /// Indicates an incorrect representation.
    #[error("Incorrect representation: got {0:?}, expected {1:?}.")]
    IncorrectRepresentation(Representation, Representation),

    /// Indicates that a vector or matrix does not have the expected shape.
    #[error("Invalid shape: got {0:?}, expected {1:?}.")]
    InvalidShape(Vec<usize>, Vec<usize>),

    /// Indicates a default error
    #[error("{0}")]
    Default(String),
}

impl From<mkhe_util::SamplingError> for Error {
    fn from(e: mkhe_util::SamplingError) -> Self {
        Error::Default(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::rq::Representation;

    #[test]
    fn error_strings() {
        assert_eq!(
            Error::InvalidModulus(0).to_string(),
            "Invalid modulus: modulus 0 should be between 2 and (1 << 62) - 1."
        );
        assert_eq!(Error::InvalidContext.to_string(), "Invalid context provided.");
        assert_eq!(
            Error::NoSuchLevel(4).to_string(),
            "No context at level 4 in this chain."
        );
        assert_eq!(
            Error::IncorrectRepresentation(Representation::PowerBasis, Representation::Ntt)
                .to_string(),
            "Incorrect representation: got PowerBasis, expected Ntt."
        );
        assert_eq!(
            Error::InvalidShape(vec![1, 8], vec![2, 8]).to_string(),
            "Invalid shape: got [1, 8], expected [2, 8]."
        );
        assert_eq!(Error::Default("test".to_string()).to_string(), "test");
    }
}
