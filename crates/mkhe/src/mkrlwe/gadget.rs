//! RNS gadget decomposition and hybrid key switching over Q·P.
//!
//! The Q primes are split into consecutive groups of `digit_size` primes. The
//! gadget vector g has one entry per group t, with g_t ≡ P modulo the primes
//! of group t and g_t ≡ 0 modulo every other prime of Q·P. A polynomial c at
//! some level decomposes into digits d_t ≡ [c]_{Q_t}, extended to the other Q
//! primes and to P by fast basis conversion, so that Σ d_t·g_t ≡ P·c modulo
//! Q·P. Inner products against gadget vectors are brought back to Q by
//! [`Gadget::mod_down`], which divides by P and rounds.

use crate::mkrlwe::ring_qp::QpPoly;
use crate::{Error, Result};
use itertools::Itertools;
use mkhe_math::{
    rns::BasisExtender,
    rq::{Context, Poly, Representation},
    zq::Modulus,
};
use mkhe_util::sample_vec_gaussian;
use ndarray::{s, Array2};
use rand::{CryptoRng, RngCore};
use std::ops::Range;
use std::sync::Arc;

/// Fast basis conversion for one digit at one level.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DigitDecomposer {
    /// Rows of the digit's primes among the Q primes of the level.
    rows: Range<usize>,
    /// Conversion from the digit's primes to the other Q primes followed by
    /// the P primes.
    extender: BasisExtender,
}

/// Precomputations for one level of the Q chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GadgetLevel {
    ctx_q: Arc<Context>,
    digits: Vec<DigitDecomposer>,
    p_to_q: BasisExtender,
    p_inv_mod_q: Box<[u64]>,
}

/// Gadget decomposition and modulus switching tables for every level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gadget {
    ctx_p: Arc<Context>,
    digit_size: usize,
    levels: Vec<GadgetLevel>,
    p_mod_q: Box<[u64]>,
}

impl Gadget {
    /// Creates the gadget for the Q contexts `ctx` (indexed by level) and the
    /// P context `ctx_p`.
    pub(crate) fn new(ctx: &[Arc<Context>], ctx_p: &Arc<Context>, digit_size: usize) -> Result<Self> {
        let full = ctx
            .last()
            .ok_or_else(|| Error::DefaultError("Empty modulus chain".to_string()))?;
        if digit_size == 0 {
            return Err(Error::DefaultError("The digit size must be positive".to_string()));
        }

        let p_mod_q = full
            .moduli_operators()
            .iter()
            .map(|qi| {
                ctx_p
                    .moduli()
                    .iter()
                    .fold(1u64, |acc, pj| qi.mul(acc, qi.reduce(*pj)))
            })
            .collect_vec();

        let mut levels = Vec::with_capacity(ctx.len());
        for ctx_q in ctx {
            let q = ctx_q.moduli();
            let mut digits = vec![];
            for start in (0..q.len()).step_by(digit_size) {
                let rows = start..(start + digit_size).min(q.len());
                let to = q[..rows.start]
                    .iter()
                    .chain(q[rows.end..].iter())
                    .chain(ctx_p.moduli().iter())
                    .copied()
                    .collect_vec();
                let extender = BasisExtender::new(&q[rows.clone()], &to)?;
                digits.push(DigitDecomposer { rows, extender });
            }

            let p_inv_mod_q = inverses(ctx_q.moduli_operators(), &p_mod_q[..q.len()])?;
            levels.push(GadgetLevel {
                ctx_q: ctx_q.clone(),
                digits,
                p_to_q: BasisExtender::new(ctx_p.moduli(), q)?,
                p_inv_mod_q: p_inv_mod_q.into_boxed_slice(),
            });
        }

        Ok(Self {
            ctx_p: ctx_p.clone(),
            digit_size,
            levels,
            p_mod_q: p_mod_q.into_boxed_slice(),
        })
    }

    /// Number of digits of the decomposition at a level.
    pub fn digit_count(&self, level: usize) -> usize {
        (level + 1).div_ceil(self.digit_size)
    }

    /// Number of digits at the top level, which is the dimension of keys.
    pub fn max_digit_count(&self) -> usize {
        self.digit_count(self.levels.len() - 1)
    }

    fn level_of(&self, ctx: &Arc<Context>) -> Result<&GadgetLevel> {
        self.levels
            .get(ctx.moduli().len().wrapping_sub(1))
            .filter(|level| level.ctx_q.moduli() == ctx.moduli())
            .ok_or_else(|| {
                Error::ConfigError("Polynomial context not in the modulus chain".to_string())
            })
    }

    /// Decomposes a polynomial in Ntt representation into its gadget digits,
    /// each in Ntt representation over Q·P.
    pub fn decompose(&self, c: &Poly) -> Result<Vec<QpPoly>> {
        c.ensure_representation(Representation::Ntt)?;
        let level = self.level_of(c.ctx())?;
        let nq = level.ctx_q.moduli().len();
        let np = self.ctx_p.moduli().len();
        let degree = level.ctx_q.degree();

        let mut c_power = c.clone();
        c_power.change_representation(Representation::PowerBasis);
        let coefficients = c_power.coefficients();

        level
            .digits
            .iter()
            .map(|digit| -> Result<QpPoly> {
                let (start, end) = (digit.rows.start, digit.rows.end);
                let group = coefficients.slice(s![start..end, ..]);
                let others = nq - (end - start);

                let mut extended = Array2::zeros((others + np, degree));
                digit.extender.extend(group, extended.view_mut())?;

                let mut q_coefficients = Array2::zeros((nq, degree));
                q_coefficients
                    .slice_mut(s![..start, ..])
                    .assign(&extended.slice(s![..start, ..]));
                q_coefficients.slice_mut(s![start..end, ..]).assign(&group);
                q_coefficients
                    .slice_mut(s![end.., ..])
                    .assign(&extended.slice(s![start..others, ..]));

                let mut q = Poly::from_coefficients(
                    &level.ctx_q,
                    Representation::PowerBasis,
                    q_coefficients.view(),
                )?;
                let mut p = Poly::from_coefficients(
                    &self.ctx_p,
                    Representation::PowerBasis,
                    extended.slice(s![others.., ..]),
                )?;
                q.change_representation(Representation::Ntt);
                p.change_representation(Representation::Ntt);
                Ok(QpPoly { q, p })
            })
            .collect()
    }

    /// Divides a polynomial modulo Q·P by P and rounds, returning a polynomial
    /// modulo Q in Ntt representation.
    pub fn mod_down(&self, x: &QpPoly) -> Result<Poly> {
        x.q.ensure_representation(Representation::Ntt)?;
        x.p.ensure_representation(Representation::Ntt)?;
        let level = self.level_of(x.q.ctx())?;

        let mut p_power = x.p.clone();
        p_power.change_representation(Representation::PowerBasis);
        let mut converted = Array2::zeros((level.ctx_q.moduli().len(), level.ctx_q.degree()));
        level
            .p_to_q
            .extend(p_power.coefficients(), converted.view_mut())?;
        let mut converted = Poly::from_coefficients(
            &level.ctx_q,
            Representation::PowerBasis,
            converted.view(),
        )?;
        converted.change_representation(Representation::Ntt);

        let mut out = &x.q - &converted;
        out.scalar_mul_per_modulus(&level.p_inv_mod_q)?;
        Ok(out)
    }

    /// Inner product over Q·P between gadget digits and a gadget vector. The
    /// vector may be defined over a longer Q chain than the digits and must
    /// have at least as many entries.
    pub fn inner_product(&self, digits: &[QpPoly], vector: &[QpPoly]) -> Result<QpPoly> {
        let first = digits
            .first()
            .ok_or_else(|| Error::DefaultError("No digit to multiply".to_string()))?;
        if vector.len() < digits.len() {
            return Err(Error::ConfigError(format!(
                "Gadget vector of dimension {} cannot absorb {} digits",
                vector.len(),
                digits.len()
            )));
        }
        let mut acc = QpPoly::zero(first.q.ctx(), &self.ctx_p);
        for (d, v) in digits.iter().zip(vector.iter()) {
            acc.mul_add_assign(d, v)?;
        }
        Ok(acc)
    }

    /// Entry-wise product of the digits h(c) with a gadget vector of μ,
    /// giving a gadget vector of c·μ whose entry t is h_t(c)·v_t. The error
    /// of entry t grows by the size of digit t only, never by all of Q.
    pub fn scale_vector(&self, digits: &[QpPoly], vector: &[QpPoly]) -> Result<Vec<QpPoly>> {
        if vector.len() < digits.len() {
            return Err(Error::ConfigError(format!(
                "Gadget vector of dimension {} cannot absorb {} digits",
                vector.len(),
                digits.len()
            )));
        }
        digits
            .iter()
            .zip(vector.iter())
            .map(|(d, v)| -> Result<QpPoly> {
                let mut out = QpPoly::zero(d.q.ctx(), &self.ctx_p);
                out.mul_add_assign(d, v)?;
                Ok(out)
            })
            .collect()
    }

    /// Generates a gadget vector encrypting `target` under `secret` with the
    /// masks `mask`: entry t equals `-secret·mask_t + e_t + target·g_t`.
    ///
    /// `secret` is over the full Q chain and P, `target` over the full Q chain;
    /// both in Ntt representation.
    pub(crate) fn switching_key<R: RngCore + CryptoRng>(
        &self,
        secret: &QpPoly,
        target: &Poly,
        mask: &[QpPoly],
        sigma: f64,
        rng: &mut R,
    ) -> Result<Vec<QpPoly>> {
        let full = self
            .levels
            .last()
            .ok_or_else(|| Error::DefaultError("Empty modulus chain".to_string()))?;
        target.ensure_representation(Representation::Ntt)?;
        if target.ctx().moduli() != full.ctx_q.moduli() {
            return Err(Error::ConfigError(
                "Switching keys encrypt polynomials over the full modulus chain".to_string(),
            ));
        }
        let nq = full.ctx_q.moduli().len();

        mask.iter()
            .take(self.max_digit_count())
            .enumerate()
            .map(|(t, a)| -> Result<QpPoly> {
                let e = sample_vec_gaussian(full.ctx_q.degree(), sigma, rng)?;
                let mut k = QpPoly::from_i64(&e, &full.ctx_q, &self.ctx_p)?;
                let mut sa = QpPoly::zero(&full.ctx_q, &self.ctx_p);
                sa.mul_add_assign(secret, a)?;
                k -= &sa;

                let rows = t * self.digit_size..((t + 1) * self.digit_size).min(nq);
                let scalars = (0..nq)
                    .map(|i| if rows.contains(&i) { self.p_mod_q[i] } else { 0 })
                    .collect_vec();
                let mut target_t = target.clone();
                target_t.scalar_mul_per_modulus(&scalars)?;
                k.q += &target_t;
                Ok(k)
            })
            .collect()
    }
}

/// Inverses of `values[i]` modulo `moduli[i]`.
fn inverses(moduli: &[Modulus], values: &[u64]) -> Result<Vec<u64>> {
    moduli
        .iter()
        .zip(values.iter())
        .map(|(qi, v)| {
            qi.inv(*v).ok_or_else(|| {
                Error::ConfigError(format!("P is not invertible modulo {}", qi.modulus()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::Gadget;
    use crate::mkrlwe::ring_qp::QpPoly;
    use mkhe_math::rq::{Context, Poly, Representation};
    use mkhe_math::zq::primes::generate_primes;
    use num_bigint::BigInt;
    use num_traits::Signed;
    use rand::thread_rng;
    use std::{error::Error, sync::Arc};

    const NQ: usize = 3;
    const NP: usize = 2;

    type Setup = (Vec<Arc<Context>>, Arc<Context>, Gadget);

    fn setup(digit_size: usize) -> Result<Setup, Box<dyn Error>> {
        let q = generate_primes(50, 32, NQ, &[]).ok_or("no prime")?;
        let p = generate_primes(60, 32, NP, &q).ok_or("no prime")?;
        let full = Context::new_arc(&q, 16)?;
        let ctx = full.chain();
        let ctx_p = Context::new_arc(&p, 16)?;
        let gadget = Gadget::new(&ctx, &ctx_p, digit_size)?;
        Ok((ctx, ctx_p, gadget))
    }

    /// The gadget vector itself: g_t = P on the primes of digit t, 0 elsewhere.
    fn gadget_vector(gadget: &Gadget, ctx: &Arc<Context>, ctx_p: &Arc<Context>) -> Vec<QpPoly> {
        let one = Poly::from_i64(&[1], ctx, Representation::Ntt).unwrap();
        let nq = ctx.moduli().len();
        (0..gadget.max_digit_count())
            .map(|t| {
                let rows = t * gadget.digit_size..((t + 1) * gadget.digit_size).min(nq);
                let scalars = (0..nq)
                    .map(|i| if rows.contains(&i) { gadget.p_mod_q[i] } else { 0 })
                    .collect::<Vec<_>>();
                let mut q = one.clone();
                q.scalar_mul_per_modulus(&scalars).unwrap();
                QpPoly {
                    q,
                    p: Poly::zero(ctx_p, Representation::Ntt),
                }
            })
            .collect()
    }

    #[test]
    fn constructor() -> Result<(), Box<dyn Error>> {
        let (ctx, ctx_p, gadget) = setup(2)?;
        assert_eq!(gadget.digit_count(0), 1);
        assert_eq!(gadget.digit_count(1), 1);
        assert_eq!(gadget.digit_count(2), 2);
        assert_eq!(gadget.max_digit_count(), 2);
        assert!(Gadget::new(&ctx, &ctx_p, 0).is_err());
        assert!(Gadget::new(&[], &ctx_p, 1).is_err());
        Ok(())
    }

    #[test]
    fn decompose_recomposes_to_p_times_input() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        for digit_size in 1..=3 {
            let (ctx, ctx_p, gadget) = setup(digit_size)?;
            let g = gadget_vector(&gadget, &ctx[NQ - 1], &ctx_p);
            for level in 0..NQ {
                let c = Poly::random(&ctx[level], Representation::Ntt, &mut rng);
                let digits = gadget.decompose(&c)?;
                assert_eq!(digits.len(), gadget.digit_count(level));

                // <h(c), g> = P·c, whose division by P gives back c.
                let recomposed = gadget.inner_product(&digits, &g)?;
                assert_eq!(gadget.mod_down(&recomposed)?, c);
            }
        }
        Ok(())
    }

    #[test]
    fn mod_down_rounds() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let (ctx, ctx_p, gadget) = setup(1)?;
        let c = Poly::random(&ctx[1], Representation::Ntt, &mut rng);

        // P·c + e divided by P is c + small.
        let e = QpPoly::from_i64(&[1000, -77, 5], &ctx[1], &ctx_p)?;
        let mut pc = QpPoly {
            q: c.clone(),
            p: Poly::zero(&ctx_p, Representation::Ntt),
        };
        let p_scalars = gadget.p_mod_q[..2].to_vec();
        pc.q.scalar_mul_per_modulus(&p_scalars)?;
        pc += &e;
        let down = gadget.mod_down(&pc)?;
        let diff = &down - &c;
        for coeff in diff.centered_coefficients() {
            assert!(coeff.abs() <= BigInt::from(NP));
        }
        Ok(())
    }

    #[test]
    fn scaled_vector_recomposes_to_product() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        for digit_size in 1..=2 {
            let (ctx, ctx_p, gadget) = setup(digit_size)?;
            let g = gadget_vector(&gadget, &ctx[NQ - 1], &ctx_p);
            for level in 0..NQ {
                let a = Poly::random(&ctx[level], Representation::Ntt, &mut rng);
                let b = Poly::random(&ctx[level], Representation::Ntt, &mut rng);

                // h(a)⊙g is a gadget vector of a, so <h(b), h(a)⊙g> = P·a·b.
                let scaled = gadget.scale_vector(&gadget.decompose(&a)?, &g)?;
                assert_eq!(scaled.len(), gadget.digit_count(level));
                let product = gadget.inner_product(&gadget.decompose(&b)?, &scaled)?;
                assert_eq!(gadget.mod_down(&product)?, &a * &b);
            }
        }

        let (ctx, _, gadget) = setup(1)?;
        let c = Poly::random(&ctx[NQ - 1], Representation::Ntt, &mut rng);
        let digits = gadget.decompose(&c)?;
        assert!(gadget.scale_vector(&digits, &digits[..1]).is_err());
        Ok(())
    }

    #[test]
    fn rejects_foreign_contexts() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let (ctx, _, gadget) = setup(1)?;
        let other = Context::new_arc(&ctx[NQ - 1].moduli()[1..], 16)?;
        let c = Poly::random(&other, Representation::Ntt, &mut rng);
        assert!(gadget.decompose(&c).is_err());
        let c = Poly::random(&other, Representation::PowerBasis, &mut rng);
        assert!(gadget.decompose(&c).is_err());
        Ok(())
    }
}
