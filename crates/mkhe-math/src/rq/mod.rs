//! Polynomials in R_q\[x\] = (ZZ_q1 x ... x ZZ_qn)\[x\] / (x^n + 1) where the
//! qi's are prime moduli in zq.

mod context;
mod convert;
mod ops;

pub use context::Context;

use crate::{Error, Result};
use itertools::{izip, Itertools};
use ndarray::{s, Array2, ArrayView2};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use zeroize::Zeroize;

/// Possible representations of the underlying polynomial.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// This is the list of coefficients ci, such that the polynomial is c0 + c1
    /// * x + ... + c_(degree - 1) * x^(degree - 1)
    #[default]
    PowerBasis,
    /// This is the NTT representation of the PowerBasis representation.
    Ntt,
    /// This is a "Shoup" representation of the Ntt representation used for
    /// faster multiplication.
    NttShoup,
}

impl Representation {
    /// Whether the representation is an evaluation representation.
    pub const fn is_ntt(&self) -> bool {
        matches!(self, Representation::Ntt | Representation::NttShoup)
    }
}

/// An exponent for a substitution x -> x^exponent, usable with any context of
/// the same degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionExponent {
    /// The value of the exponent.
    pub exponent: usize,

    degree: usize,
    power_bitrev: Vec<usize>,
}

impl SubstitutionExponent {
    /// Creates a substitution element from an exponent.
    /// Returns an error if the exponent is even modulo 2 * degree or if the
    /// degree is not a power of two.
    pub fn new(degree: usize, exponent: usize) -> Result<Self> {
        if !degree.is_power_of_two() {
            return Err(Error::Default(format!(
                "The degree {degree} is not a power of two"
            )));
        }
        let exponent = exponent % (2 * degree);
        if exponent & 1 == 0 {
            return Err(Error::Default(
                "The exponent should be odd modulo 2 * degree".to_string(),
            ));
        }
        let shift = degree.leading_zeros() + 1;
        let mask = degree - 1;
        let power_bitrev = (0..degree)
            .scan((exponent - 1) / 2, |power, _| {
                let r = (*power & mask).reverse_bits() >> shift;
                *power += exponent;
                Some(r)
            })
            .collect_vec();
        Ok(Self {
            exponent,
            degree,
            power_bitrev,
        })
    }
}

/// Struct that holds a polynomial for a specific context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    ctx: Arc<Context>,
    representation: Representation,
    coefficients: Array2<u64>,
    coefficients_shoup: Option<Array2<u64>>,
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coefficients.iter_mut().for_each(|c| c.zeroize());
        self.zeroize_shoup()
    }
}

impl AsRef<Poly> for Poly {
    fn as_ref(&self) -> &Poly {
        self
    }
}

/// Mutable rows of a matrix of coefficients allocated by this module.
fn rows_mut(coefficients: &mut Array2<u64>) -> std::slice::ChunksExactMut<'_, u64> {
    let degree = coefficients.ncols();
    coefficients
        .as_slice_mut()
        .expect("coefficients are stored in standard layout")
        .chunks_exact_mut(degree)
}

impl Poly {
    /// Creates a polynomial holding the constant 0.
    pub fn zero(ctx: &Arc<Context>, representation: Representation) -> Self {
        Self {
            ctx: ctx.clone(),
            representation,
            coefficients: Array2::zeros((ctx.q.len(), ctx.degree)),
            coefficients_shoup: if representation == Representation::NttShoup {
                Some(Array2::zeros((ctx.q.len(), ctx.degree)))
            } else {
                None
            },
        }
    }

    /// Creates a polynomial from a matrix of residues, one row per modulus of
    /// the context.
    ///
    /// Returns an error if the shape is incorrect or a residue is not reduced.
    pub fn from_coefficients(
        ctx: &Arc<Context>,
        representation: Representation,
        coefficients: ArrayView2<u64>,
    ) -> Result<Self> {
        let expected = [ctx.q.len(), ctx.degree];
        if coefficients.shape() != expected {
            return Err(Error::InvalidShape(
                coefficients.shape().to_vec(),
                expected.to_vec(),
            ));
        }
        for (row, qi) in izip!(coefficients.outer_iter(), ctx.q.iter()) {
            if row.iter().any(|c| *c >= qi.p) {
                return Err(Error::Default(format!(
                    "Coefficient not reduced modulo {}",
                    qi.p
                )));
            }
        }
        let mut p = Poly::zero(ctx, Representation::PowerBasis);
        p.coefficients.assign(&coefficients);
        p.representation = if representation == Representation::NttShoup {
            Representation::Ntt
        } else {
            representation
        };
        p.change_representation(representation);
        Ok(p)
    }

    /// Creates a polynomial from signed coefficients given in power basis,
    /// converted to the specified representation. Missing coefficients are 0.
    ///
    /// Returns an error if there are more coefficients than the degree.
    pub fn from_i64(
        coefficients: &[i64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if coefficients.len() > ctx.degree {
            return Err(Error::Default(format!(
                "Too many coefficients: {} > {}",
                coefficients.len(),
                ctx.degree
            )));
        }
        let mut p = Poly::zero(ctx, Representation::PowerBasis);
        for (row, qi) in izip!(rows_mut(&mut p.coefficients), ctx.q.iter()) {
            izip!(row.iter_mut(), coefficients.iter()).for_each(|(r, c)| *r = qi.reduce_i64(*c));
        }
        p.change_representation(representation);
        Ok(p)
    }

    /// Access the context of the polynomial.
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Current representation of the polynomial.
    pub const fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Returns an error if the polynomial is not in the `expected`
    /// representation.
    pub fn ensure_representation(&self, expected: Representation) -> Result<()> {
        if self.representation != expected {
            Err(Error::IncorrectRepresentation(self.representation, expected))
        } else {
            Ok(())
        }
    }

    /// Access the polynomial coefficients in RNS representation.
    pub fn coefficients(&self) -> ArrayView2<'_, u64> {
        self.coefficients.view()
    }

    fn zeroize_shoup(&mut self) {
        if let Some(shoup) = self.coefficients_shoup.as_mut() {
            shoup.iter_mut().for_each(|c| c.zeroize())
        }
    }

    /// Change the representation of the underlying polynomial.
    pub fn change_representation(&mut self, to: Representation) {
        match (self.representation, to) {
            (Representation::PowerBasis, Representation::Ntt) => self.ntt_forward(),
            (Representation::PowerBasis, Representation::NttShoup) => {
                self.ntt_forward();
                self.compute_coefficients_shoup()
            }
            (Representation::Ntt, Representation::PowerBasis) => self.ntt_backward(),
            (Representation::Ntt, Representation::NttShoup) => self.compute_coefficients_shoup(),
            (Representation::NttShoup, Representation::PowerBasis) => {
                self.zeroize_shoup();
                self.coefficients_shoup = None;
                self.ntt_backward()
            }
            (Representation::NttShoup, Representation::Ntt) => {
                self.zeroize_shoup();
                self.coefficients_shoup = None;
            }
            _ => {}
        }
        self.representation = to;
    }

    fn compute_coefficients_shoup(&mut self) {
        let mut coefficients_shoup = Array2::zeros((self.ctx.q.len(), self.ctx.degree));
        izip!(
            rows_mut(&mut coefficients_shoup),
            self.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(shoup, v, qi)| {
            izip!(shoup.iter_mut(), v.iter()).for_each(|(s, vi)| *s = qi.shoup(*vi))
        });
        self.coefficients_shoup = Some(coefficients_shoup)
    }

    fn ntt_forward(&mut self) {
        izip!(rows_mut(&mut self.coefficients), self.ctx.ops.iter())
            .for_each(|(v, op)| op.forward(v));
    }

    fn ntt_backward(&mut self) {
        izip!(rows_mut(&mut self.coefficients), self.ctx.ops.iter())
            .for_each(|(v, op)| op.backward(v));
    }

    /// Generate a random polynomial.
    pub fn random<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        rng: &mut R,
    ) -> Self {
        let mut p = Poly::zero(ctx, Representation::Ntt);
        izip!(rows_mut(&mut p.coefficients), ctx.q.iter())
            .for_each(|(v, qi)| v.copy_from_slice(&qi.random_vec(ctx.degree, rng)));
        // A uniform polynomial is uniform in every representation.
        p.representation = match representation {
            Representation::PowerBasis => Representation::PowerBasis,
            _ => Representation::Ntt,
        };
        p.change_representation(representation);
        p
    }

    /// Generate a random polynomial deterministically from a seed.
    pub fn random_from_seed(
        ctx: &Arc<Context>,
        representation: Representation,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Self {
        // Let's hash the seed into a ChaCha8Rng seed.
        let mut hasher = Sha256::new();
        hasher.update(seed);
        let mut prng =
            ChaCha8Rng::from_seed(<ChaCha8Rng as SeedableRng>::Seed::from(hasher.finalize()));
        Poly::random(ctx, representation, &mut prng)
    }

    /// Substitute x by x^i in a polynomial.
    /// In PowerBasis representation, i can be any integer that is not a
    /// multiple of 2 * degree. In Ntt and NttShoup representation, i can be any
    /// odd integer that is not a multiple of 2 * degree.
    pub fn substitute(&self, i: &SubstitutionExponent) -> Result<Poly> {
        if i.degree != self.ctx.degree {
            return Err(Error::InvalidContext);
        }
        let mut q = Poly::zero(&self.ctx, self.representation);
        match self.representation {
            Representation::Ntt | Representation::NttShoup => {
                let permute = |q_rows: &mut Array2<u64>, p_rows: &Array2<u64>| {
                    izip!(q_rows.outer_iter_mut(), p_rows.outer_iter()).for_each(
                        |(mut q_row, p_row)| {
                            for (j, k) in izip!(self.ctx.bitrev.iter(), i.power_bitrev.iter()) {
                                q_row[*j] = p_row[*k]
                            }
                        },
                    )
                };
                permute(&mut q.coefficients, &self.coefficients);
                if let (Some(q_shoup), Some(p_shoup)) =
                    (q.coefficients_shoup.as_mut(), self.coefficients_shoup.as_ref())
                {
                    permute(q_shoup, p_shoup)
                }
            }
            Representation::PowerBasis => {
                let mut power = 0usize;
                let mask = self.ctx.degree - 1;
                for j in 0..self.ctx.degree {
                    izip!(
                        self.ctx.q.iter(),
                        q.coefficients.slice_mut(s![.., power & mask]),
                        self.coefficients.slice(s![.., j])
                    )
                    .for_each(|(qi, qij, pij)| {
                        if power & self.ctx.degree != 0 {
                            *qij = qi.sub(*qij, *pij)
                        } else {
                            *qij = qi.add(*qij, *pij)
                        }
                    });
                    power += i.exponent
                }
            }
        }

        Ok(q)
    }

    /// Restrict the polynomial to a context whose moduli are a prefix of the
    /// moduli of the current context, by dropping the residues of the
    /// remaining moduli.
    pub fn truncate(&self, ctx: &Arc<Context>) -> Result<Poly> {
        if !ctx.is_prefix_of(&self.ctx) {
            return Err(Error::InvalidContext);
        }
        let nrows = ctx.q.len();
        Ok(Poly {
            ctx: ctx.clone(),
            representation: self.representation,
            coefficients: self.coefficients.slice(s![..nrows, ..]).to_owned(),
            coefficients_shoup: self
                .coefficients_shoup
                .as_ref()
                .map(|c| c.slice(s![..nrows, ..]).to_owned()),
        })
    }

    /// Multiply the residues modulo the i-th modulus by `scalars[i]`.
    ///
    /// Returns an error if there is not exactly one scalar per modulus.
    pub fn scalar_mul_per_modulus(&mut self, scalars: &[u64]) -> Result<()> {
        if scalars.len() != self.ctx.q.len() {
            return Err(Error::InvalidShape(
                vec![scalars.len()],
                vec![self.ctx.q.len()],
            ));
        }
        if self.representation == Representation::NttShoup {
            self.change_representation(Representation::Ntt);
            izip!(rows_mut(&mut self.coefficients), self.ctx.q.iter(), scalars.iter())
                .for_each(|(v, qi, si)| qi.scalar_mul_vec(v, qi.reduce(*si)));
            self.change_representation(Representation::NttShoup);
        } else {
            izip!(rows_mut(&mut self.coefficients), self.ctx.q.iter(), scalars.iter())
                .for_each(|(v, qi, si)| qi.scalar_mul_vec(v, qi.reduce(*si)));
        }
        Ok(())
    }
}
