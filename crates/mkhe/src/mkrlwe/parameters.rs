//! Create parameters for the multi-key RLWE scheme

use crate::mkrlwe::{crs::Crs, gadget::Gadget, CrsSlot};
use crate::{Error, ParametersError, Result};
use itertools::Itertools;
use mkhe_math::{
    ntt::supports_ntt,
    rq::{Context, SubstitutionExponent},
    zq::{primes::generate_prime, Modulus},
};
use mkhe_traits::FheParameters;
use mkhe_util::is_prime;
use rand::{thread_rng, CryptoRng, Rng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;

/// Distribution of the secret keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SecretDistribution {
    /// Uniform coefficients in {-1, 0, 1}.
    #[default]
    Ternary,
    /// Ternary coefficients with exactly the given number of non-zero entries.
    SparseTernary(usize),
    /// Rounded Gaussian coefficients with the error standard deviation.
    Gaussian,
}

/// Parameters for the multi-key RLWE scheme.
pub struct Parameters {
    /// Number of coefficients in a polynomial.
    polynomial_degree: usize,

    /// Vector of coprime moduli q_i of the main chain.
    moduli: Box<[u64]>,

    /// Vector of coprime moduli p_j of the auxiliary chain.
    p_moduli: Box<[u64]>,

    /// Number of Q primes per gadget digit.
    digit_size: usize,

    /// Standard deviation of the error distribution.
    sigma: f64,

    secret_distribution: SecretDistribution,

    /// Rotation amounts with a registered CRS slot, reduced modulo degree / 2.
    rotations: Box<[usize]>,

    conjugation: bool,

    /// Contexts of the Q chain, indexed by level.
    pub(crate) ctx: Vec<Arc<Context>>,

    /// Context of the P chain.
    pub(crate) ctx_p: Arc<Context>,

    pub(crate) gadget: Gadget,

    pub(crate) crs: Crs,
}

impl Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameters")
            .field("polynomial_degree", &self.polynomial_degree)
            .field("moduli", &self.moduli)
            .field("p_moduli", &self.p_moduli)
            .field("digit_size", &self.digit_size)
            .field("sigma", &self.sigma)
            .field("rotations", &self.rotations)
            .field("conjugation", &self.conjugation)
            .finish()
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.polynomial_degree == other.polynomial_degree
            && self.moduli == other.moduli
            && self.p_moduli == other.p_moduli
            && self.digit_size == other.digit_size
            && self.sigma.to_bits() == other.sigma.to_bits()
            && self.secret_distribution == other.secret_distribution
            && self.rotations == other.rotations
            && self.conjugation == other.conjugation
            && self.crs.seed() == other.crs.seed()
    }
}

impl Eq for Parameters {}

impl FheParameters for Parameters {}

impl Parameters {
    /// Returns the underlying polynomial degree
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns a reference to the moduli of the main chain
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the moduli of the auxiliary chain
    pub fn p_moduli(&self) -> &[u64] {
        &self.p_moduli
    }

    /// Returns the number of Q primes per gadget digit
    pub const fn digit_size(&self) -> usize {
        self.digit_size
    }

    /// Returns the standard deviation of the error distribution
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Returns the secret key distribution
    pub const fn secret_distribution(&self) -> SecretDistribution {
        self.secret_distribution
    }

    /// Returns the registered rotation amounts
    pub fn rotations(&self) -> &[usize] {
        &self.rotations
    }

    /// Returns whether conjugation keys can be generated
    pub const fn conjugation(&self) -> bool {
        self.conjugation
    }

    /// Returns the common reference string
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Returns the gadget
    pub fn gadget(&self) -> &Gadget {
        &self.gadget
    }

    /// Returns the maximum level allowed by these parameters.
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Returns the context of the Q chain at a level.
    pub fn ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
        self.ctx.get(level).ok_or(Error::LevelMismatch {
            expected: level,
            found: self.max_level(),
        })
    }

    /// Returns the context of the P chain.
    pub fn ctx_p(&self) -> &Arc<Context> {
        &self.ctx_p
    }

    /// Returns the level of a given context
    pub fn level_of_ctx(&self, ctx: &Arc<Context>) -> Result<usize> {
        let level = ctx.moduli().len().wrapping_sub(1);
        match self.ctx.get(level) {
            Some(c) if c.moduli() == ctx.moduli() && c.degree() == ctx.degree() => Ok(level),
            _ => Err(Error::ConfigError(
                "The context does not belong to the parameters".to_string(),
            )),
        }
    }

    /// Reduces a rotation amount modulo degree / 2.
    pub fn normalize_rotation(&self, amount: usize) -> usize {
        amount % (self.polynomial_degree >> 1)
    }

    /// The Galois element 5^amount mod 2 * degree of a rotation.
    pub fn rotation_exponent(&self, amount: usize) -> Result<SubstitutionExponent> {
        let m = 2 * self.polynomial_degree as u64;
        let amount = self.normalize_rotation(amount) as u64;
        let exponent = (0..amount).fold(1u64, |acc, _| (acc * 5) % m);
        Ok(SubstitutionExponent::new(
            self.polynomial_degree,
            exponent as usize,
        )?)
    }

    /// The Galois element 2 * degree - 1 of the conjugation.
    pub fn conjugation_exponent(&self) -> Result<SubstitutionExponent> {
        Ok(SubstitutionExponent::new(
            self.polynomial_degree,
            2 * self.polynomial_degree - 1,
        )?)
    }

    /// Whether two parameter handles describe the same parameters.
    pub(crate) fn same_as(self: &Arc<Self>, other: &Arc<Self>) -> bool {
        Arc::ptr_eq(self, other) || **self == **other
    }

    #[cfg(test)]
    pub(crate) fn default_arc(num_moduli: usize, num_p_moduli: usize, degree: usize) -> Arc<Self> {
        ParametersBuilder::new()
            .set_degree(degree)
            .set_moduli_sizes(&vec![50usize; num_moduli])
            .set_p_moduli_sizes(&vec![60usize; num_p_moduli])
            .set_rotations(&[1, 2, 3])
            .set_conjugation(true)
            .build_arc()
            .unwrap()
    }
}

/// Builder for parameters for the multi-key RLWE scheme.
#[derive(Debug, Clone)]
pub struct ParametersBuilder {
    degree: usize,
    moduli: Vec<u64>,
    moduli_sizes: Vec<usize>,
    p_moduli: Vec<u64>,
    p_moduli_sizes: Vec<usize>,
    digit_size: usize,
    sigma: f64,
    secret_distribution: SecretDistribution,
    rotations: Vec<usize>,
    conjugation: bool,
    crs_seed: Option<[u8; 32]>,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametersBuilder {
    /// Creates a new instance of the builder
    pub fn new() -> Self {
        Self {
            degree: Default::default(),
            moduli: Default::default(),
            moduli_sizes: Default::default(),
            p_moduli: Default::default(),
            p_moduli_sizes: Default::default(),
            digit_size: 1,
            sigma: 3.2,
            secret_distribution: SecretDistribution::Ternary,
            rotations: Default::default(),
            conjugation: false,
            crs_seed: None,
        }
    }

    /// Sets the polynomial degree. Returns an error if the degree is not
    /// a power of two larger or equal to 8.
    pub fn set_degree(&mut self, degree: usize) -> &mut Self {
        self.degree = degree;
        self
    }

    /// Sets the moduli of the main chain.
    pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        self.moduli.clone_from(&moduli.to_vec());
        self
    }

    /// Sets the sizes of the moduli of the main chain; the moduli are
    /// generated at build time.
    pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        self.moduli_sizes.clone_from(&sizes.to_vec());
        self
    }

    /// Sets the moduli of the auxiliary chain.
    pub fn set_p_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        self.p_moduli.clone_from(&moduli.to_vec());
        self
    }

    /// Sets the sizes of the moduli of the auxiliary chain.
    pub fn set_p_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        self.p_moduli_sizes.clone_from(&sizes.to_vec());
        self
    }

    /// Sets the number of Q primes per gadget digit.
    pub fn set_digit_size(&mut self, digit_size: usize) -> &mut Self {
        self.digit_size = digit_size;
        self
    }

    /// Sets the standard deviation of the error distribution.
    pub fn set_sigma(&mut self, sigma: f64) -> &mut Self {
        self.sigma = sigma;
        self
    }

    /// Sets the secret key distribution.
    pub fn set_secret_distribution(&mut self, distribution: SecretDistribution) -> &mut Self {
        self.secret_distribution = distribution;
        self
    }

    /// Registers the rotation amounts for which rotation keys can be generated.
    pub fn set_rotations(&mut self, rotations: &[usize]) -> &mut Self {
        self.rotations.clone_from(&rotations.to_vec());
        self
    }

    /// Enables conjugation keys.
    pub fn set_conjugation(&mut self, conjugation: bool) -> &mut Self {
        self.conjugation = conjugation;
        self
    }

    /// Sets the seed of the common reference string. Without a seed, the build
    /// draws one from its random number generator, so parties that are to share
    /// a common reference string must agree on this seed.
    pub fn set_crs_seed(&mut self, seed: [u8; 32]) -> &mut Self {
        self.crs_seed = Some(seed);
        self
    }

    /// Generate moduli with the specified sizes, avoiding `exclude`.
    fn generate_moduli(moduli_sizes: &[usize], degree: usize, exclude: &[u64]) -> Result<Vec<u64>> {
        let mut moduli = vec![];
        for size in moduli_sizes {
            if *size > 62 || *size < 10 {
                return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                    *size, 10, 62,
                )));
            }

            let mut upper_bound = 1 << size;
            loop {
                if let Some(prime) = generate_prime(*size, 2 * degree as u64, upper_bound) {
                    if !moduli.contains(&prime) && !exclude.contains(&prime) {
                        moduli.push(prime);
                        break;
                    } else {
                        upper_bound = prime;
                    }
                } else {
                    return Err(Error::ParametersError(ParametersError::NotEnoughPrimes(
                        *size, degree,
                    )));
                }
            }
        }

        Ok(moduli)
    }

    /// Returns the explicit moduli, or moduli generated from their sizes.
    fn resolve_moduli(
        name: &str,
        moduli: &[u64],
        sizes: &[usize],
        degree: usize,
        exclude: &[u64],
    ) -> Result<Vec<u64>> {
        if !moduli.is_empty() && !sizes.is_empty() {
            Err(Error::ParametersError(ParametersError::TooManySpecified(
                format!("Only one of `{name}` and `{name}_sizes` can be specified"),
            )))
        } else if !moduli.is_empty() {
            Ok(moduli.to_vec())
        } else if !sizes.is_empty() {
            Self::generate_moduli(sizes, degree, exclude)
        } else {
            Err(Error::ParametersError(ParametersError::TooFewSpecified(
                format!("One of `{name}` and `{name}_sizes` must be specified"),
            )))
        }
    }

    /// Build a new `Parameters` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<Parameters>> {
        self.build().map(Arc::new)
    }

    /// Build a new `Parameters` inside an `Arc`, drawing a missing CRS seed
    /// from `rng`.
    pub fn build_arc_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<Arc<Parameters>> {
        self.build_with_rng(rng).map(Arc::new)
    }

    /// Build a new `Parameters`. A missing CRS seed is drawn from
    /// [`thread_rng`].
    pub fn build(&self) -> Result<Parameters> {
        self.build_with_rng(&mut thread_rng())
    }

    /// Build a new `Parameters`, drawing a missing CRS seed from `rng`.
    pub fn build_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Parameters> {
        // Check that the degree is a power of 2 (and large enough).
        if self.degree < 8 || !self.degree.is_power_of_two() {
            return Err(Error::ParametersError(ParametersError::InvalidDegree(
                self.degree,
            )));
        }
        if self.digit_size == 0 {
            return Err(Error::ParametersError(ParametersError::InvalidDigitSize(0)));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(Error::ParametersError(ParametersError::InvalidSigma(
                self.sigma.to_string(),
            )));
        }
        if let SecretDistribution::SparseTernary(h) = self.secret_distribution {
            if h == 0 || h > self.degree {
                return Err(Error::ParametersError(ParametersError::InvalidHammingWeight(
                    h,
                    self.degree,
                )));
            }
        }

        let moduli = Self::resolve_moduli(
            "moduli",
            &self.moduli,
            &self.moduli_sizes,
            self.degree,
            &[],
        )?;
        let p_moduli = Self::resolve_moduli(
            "p_moduli",
            &self.p_moduli,
            &self.p_moduli_sizes,
            self.degree,
            &moduli,
        )?;

        let mut seen = Vec::with_capacity(moduli.len() + p_moduli.len());
        for m in moduli.iter().chain(p_moduli.iter()) {
            if seen.contains(m) {
                return Err(Error::ParametersError(ParametersError::DuplicateModulus(*m)));
            }
            seen.push(*m);
            if Modulus::new(*m).is_err() || !is_prime(*m) {
                return Err(Error::ParametersError(ParametersError::InvalidModulus(
                    *m,
                    "not a prime of at most 62 bits".to_string(),
                )));
            }
            if !supports_ntt(*m, self.degree) {
                return Err(Error::ParametersError(ParametersError::InvalidModulus(
                    *m,
                    format!("does not support the NTT of size {}", self.degree),
                )));
            }
        }

        let full = Context::new_arc(&moduli, self.degree)?;
        let ctx = full.chain();
        let ctx_p = Context::new_arc(&p_moduli, self.degree)?;
        let gadget = Gadget::new(&ctx, &ctx_p, self.digit_size)?;

        let rotations = self
            .rotations
            .iter()
            .map(|k| k % (self.degree >> 1))
            .sorted()
            .dedup()
            .collect_vec();

        let mut slots = vec![CrsSlot::Relin, CrsSlot::Universal];
        slots.extend(rotations.iter().map(|k| CrsSlot::Rotation(*k)));
        if self.conjugation {
            slots.push(CrsSlot::Conjugation);
        }
        let seed = self.crs_seed.unwrap_or_else(|| {
            let mut seed = [0u8; 32];
            rng.fill(&mut seed);
            seed
        });
        let crs = Crs::new(seed, &slots, gadget.max_digit_count(), &full, &ctx_p);

        Ok(Parameters {
            polynomial_degree: self.degree,
            moduli: moduli.into_boxed_slice(),
            p_moduli: p_moduli.into_boxed_slice(),
            digit_size: self.digit_size,
            sigma: self.sigma,
            secret_distribution: self.secret_distribution,
            rotations: rotations.into_boxed_slice(),
            conjugation: self.conjugation,
            ctx,
            ctx_p,
            gadget,
            crs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Parameters, ParametersBuilder, SecretDistribution};
    use crate::mkrlwe::CrsSlot;
    use crate::{Error, ParametersError};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::error::Error as StdError;

    #[test]
    fn default() {
        let params = Parameters::default_arc(2, 3, 16);
        assert_eq!(params.moduli().len(), 2);
        assert_eq!(params.p_moduli().len(), 3);
        assert_eq!(params.degree(), 16);
        assert_eq!(params.max_level(), 1);
        assert_eq!(params.rotations(), &[1, 2, 3]);
        assert!(params.conjugation());
        assert!(params.moduli().iter().all(|q| !params.p_moduli().contains(q)));
    }

    #[test]
    fn builder() -> Result<(), Box<dyn StdError>> {
        let params = ParametersBuilder::new()
            .set_degree(16)
            .set_moduli_sizes(&[50, 50, 50])
            .set_p_moduli_sizes(&[60, 60])
            .set_digit_size(2)
            .set_sigma(3.0)
            .set_secret_distribution(SecretDistribution::SparseTernary(4))
            .set_rotations(&[9, 1, 1])
            .set_crs_seed([3u8; 32])
            .build()?;
        assert_eq!(params.digit_size(), 2);
        assert_eq!(params.sigma(), 3.0);
        assert_eq!(params.rotations(), &[1]);
        assert_eq!(params.gadget().max_digit_count(), 2);
        assert_eq!(params.ctx_at_level(0)?.moduli(), &params.moduli()[..1]);
        assert!(params.ctx_at_level(3).is_err());
        assert_eq!(params.level_of_ctx(params.ctx_at_level(1)?)?, 1);
        assert!(params.level_of_ctx(params.ctx_p()).is_err());
        assert!(params.crs().get(CrsSlot::Rotation(1)).is_ok());
        assert_eq!(
            params.crs().get(CrsSlot::Conjugation).err(),
            Some(Error::MissingCrs(CrsSlot::Conjugation))
        );

        // The same seed yields the same common reference string.
        let again = ParametersBuilder::new()
            .set_degree(16)
            .set_moduli(params.moduli())
            .set_p_moduli(params.p_moduli())
            .set_digit_size(2)
            .set_sigma(3.0)
            .set_secret_distribution(SecretDistribution::SparseTernary(4))
            .set_rotations(&[1])
            .set_crs_seed([3u8; 32])
            .build()?;
        assert_eq!(params, again);
        assert_eq!(params.crs(), again.crs());
        Ok(())
    }

    #[test]
    fn crs_seed_from_rng() -> Result<(), Box<dyn StdError>> {
        let mut builder = ParametersBuilder::new();
        builder
            .set_degree(16)
            .set_moduli_sizes(&[50, 50])
            .set_p_moduli_sizes(&[60]);

        let a = builder.build_with_rng(&mut ChaCha8Rng::seed_from_u64(7))?;
        let b = builder.build_arc_with_rng(&mut ChaCha8Rng::seed_from_u64(7))?;
        let c = builder.build_with_rng(&mut ChaCha8Rng::seed_from_u64(8))?;
        assert_eq!(&a, b.as_ref());
        assert_eq!(a.crs(), b.crs());
        assert_ne!(a.crs(), c.crs());

        // An explicit seed takes precedence over the generator.
        builder.set_crs_seed([5u8; 32]);
        let d = builder.build_with_rng(&mut ChaCha8Rng::seed_from_u64(7))?;
        let e = builder.build_with_rng(&mut ChaCha8Rng::seed_from_u64(8))?;
        assert_eq!(d.crs(), e.crs());
        assert_eq!(d.crs(), builder.build()?.crs());
        assert_ne!(a.crs(), d.crs());
        Ok(())
    }

    #[test]
    fn galois_elements() -> Result<(), Box<dyn StdError>> {
        let params = Parameters::default_arc(1, 2, 16);
        assert_eq!(params.rotation_exponent(0)?.exponent, 1);
        assert_eq!(params.rotation_exponent(1)?.exponent, 5);
        assert_eq!(params.rotation_exponent(2)?.exponent, 25);
        assert_eq!(params.rotation_exponent(3)?.exponent, 125 % 32);
        assert_eq!(params.rotation_exponent(9)?.exponent, 5);
        assert_eq!(params.conjugation_exponent()?.exponent, 31);
        Ok(())
    }

    #[test]
    fn validation() {
        let build = |f: &dyn Fn(&mut ParametersBuilder)| {
            let mut builder = ParametersBuilder::new();
            builder
                .set_degree(16)
                .set_moduli_sizes(&[50])
                .set_p_moduli_sizes(&[60]);
            f(&mut builder);
            builder.build().err()
        };

        assert_eq!(
            build(&|b| {
                b.set_degree(12);
            }),
            Some(Error::ParametersError(ParametersError::InvalidDegree(12)))
        );
        assert_eq!(
            build(&|b| {
                b.set_degree(4);
            }),
            Some(Error::ParametersError(ParametersError::InvalidDegree(4)))
        );
        assert!(matches!(
            build(&|b| {
                b.set_moduli(&[1153]);
            }),
            Some(Error::ParametersError(ParametersError::TooManySpecified(_)))
        ));
        assert!(matches!(
            build(&|b| {
                b.set_p_moduli_sizes(&[]);
            }),
            Some(Error::ParametersError(ParametersError::TooFewSpecified(_)))
        ));
        assert_eq!(
            build(&|b| {
                b.set_moduli_sizes(&[]).set_moduli(&[1153, 1153]);
            }),
            Some(Error::ParametersError(ParametersError::DuplicateModulus(1153)))
        );
        assert!(matches!(
            build(&|b| {
                b.set_moduli_sizes(&[]).set_moduli(&[1155]);
            }),
            Some(Error::ParametersError(ParametersError::InvalidModulus(1155, _)))
        ));
        assert!(matches!(
            build(&|b| {
                // 1153 supports the NTT up to degree 64 only.
                b.set_degree(128).set_moduli_sizes(&[]).set_moduli(&[1153]);
            }),
            Some(Error::ParametersError(ParametersError::InvalidModulus(1153, _)))
        ));
        assert_eq!(
            build(&|b| {
                b.set_moduli_sizes(&[63]);
            }),
            Some(Error::ParametersError(ParametersError::InvalidModulusSize(
                63, 10, 62
            )))
        );
        assert_eq!(
            build(&|b| {
                b.set_digit_size(0);
            }),
            Some(Error::ParametersError(ParametersError::InvalidDigitSize(0)))
        );
        assert!(matches!(
            build(&|b| {
                b.set_sigma(-1.0);
            }),
            Some(Error::ParametersError(ParametersError::InvalidSigma(_)))
        ));
        assert!(matches!(
            build(&|b| {
                b.set_secret_distribution(SecretDistribution::SparseTernary(17));
            }),
            Some(Error::ParametersError(ParametersError::InvalidHammingWeight(17, 16)))
        ));
        assert!(build(&|_| {}).is_none());
    }
}
