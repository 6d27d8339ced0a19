//! Fast basis conversion between two RNS bases.

use crate::{zq::Modulus, Error, Result};
use itertools::{izip, Itertools};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};

/// Number of u128 products accumulated before a lazy reduction.
const LAZY_TERMS: usize = 8;

/// Fast (approximate) basis conversion from a basis A = {a_i} to a basis
/// B = {b_j}.
///
/// Given the residues of x in [0, A), computes for every b_j the residue of
/// `sum_i [x * (A / a_i)^-1]_{a_i} * (A / a_i)`, which equals `x + k * A`
/// modulo b_j for some integer `0 <= k < |A|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisExtender {
    from: Box<[Modulus]>,
    to: Box<[Modulus]>,
    a_hat_inv: Box<[u64]>,
    a_hat_inv_shoup: Box<[u64]>,
    // a_hat_mod_b[[j, i]] = (A / a_i) mod b_j
    a_hat_mod_b: Array2<u64>,
}

impl BasisExtender {
    /// Create a basis extender from the moduli `from` to the moduli `to`.
    ///
    /// Returns an error if any modulus is invalid or if the moduli in `from` are
    /// not pairwise coprime.
    pub fn new(from: &[u64], to: &[u64]) -> Result<Self> {
        if from.is_empty() || to.is_empty() {
            return Err(Error::Default("Empty basis".to_string()));
        }

        let from_q = from.iter().map(|ai| Modulus::new(*ai)).collect::<Result<Vec<_>>>()?;
        let to_q = to.iter().map(|bj| Modulus::new(*bj)).collect::<Result<Vec<_>>>()?;

        let product = from
            .iter()
            .fold(BigUint::one(), |acc, ai| acc * BigUint::from(*ai));

        let mut a_hat_inv = Vec::with_capacity(from.len());
        for ai in &from_q {
            let a_hat = &product / BigUint::from(ai.p);
            let a_hat_mod_ai = (a_hat % BigUint::from(ai.p))
                .to_u64()
                .ok_or(Error::InvalidModulus(ai.p))?;
            let inv = ai
                .inv(a_hat_mod_ai)
                .ok_or_else(|| Error::Default("The moduli are not coprime".to_string()))?;
            a_hat_inv.push(inv);
        }

        let mut a_hat_mod_b = Array2::zeros((to.len(), from.len()));
        for (mut row, bj) in izip!(a_hat_mod_b.outer_iter_mut(), to.iter()) {
            for (entry, ai) in izip!(row.iter_mut(), from.iter()) {
                let a_hat = &product / BigUint::from(*ai);
                *entry = (a_hat % BigUint::from(*bj)).to_u64().unwrap_or_default();
            }
        }

        let a_hat_inv_shoup = izip!(from_q.iter(), a_hat_inv.iter())
            .map(|(ai, inv)| ai.shoup(*inv))
            .collect_vec();

        Ok(Self {
            from: from_q.into_boxed_slice(),
            to: to_q.into_boxed_slice(),
            a_hat_inv: a_hat_inv.into_boxed_slice(),
            a_hat_inv_shoup: a_hat_inv_shoup.into_boxed_slice(),
            a_hat_mod_b,
        })
    }

    /// Moduli of the input basis.
    pub fn from_moduli(&self) -> &[Modulus] {
        &self.from
    }

    /// Moduli of the output basis.
    pub fn to_moduli(&self) -> &[Modulus] {
        &self.to
    }

    /// Convert the columns of `input` (one row per modulus of the input basis)
    /// into `output` (one row per modulus of the output basis).
    ///
    /// Returns an error if the shapes do not match the bases.
    pub fn extend(&self, input: ArrayView2<u64>, mut output: ArrayViewMut2<u64>) -> Result<()> {
        let degree = input.ncols();
        if input.nrows() != self.from.len() {
            return Err(Error::InvalidShape(
                input.shape().to_vec(),
                vec![self.from.len(), degree],
            ));
        }
        if output.nrows() != self.to.len() || output.ncols() != degree {
            return Err(Error::InvalidShape(
                output.shape().to_vec(),
                vec![self.to.len(), degree],
            ));
        }

        // y_i = [x * (A / a_i)^-1]_{a_i}
        let mut y = input.to_owned();
        izip!(
            y.outer_iter_mut(),
            self.from.iter(),
            self.a_hat_inv.iter(),
            self.a_hat_inv_shoup.iter()
        )
        .for_each(|(mut yi, ai, inv, inv_shoup)| {
            yi.iter_mut()
                .for_each(|yij| *yij = ai.mul_shoup(*yij, *inv, *inv_shoup))
        });

        let mut acc = vec![0u128; degree];
        for (mut out_j, bj, a_hat_j) in izip!(
            output.outer_iter_mut(),
            self.to.iter(),
            self.a_hat_mod_b.outer_iter()
        ) {
            acc.iter_mut().for_each(|a| *a = 0);
            for (i, (yi, c)) in izip!(y.outer_iter(), a_hat_j.iter()).enumerate() {
                izip!(acc.iter_mut(), yi.iter())
                    .for_each(|(a, yik)| *a += (*yik as u128) * (*c as u128));
                if (i + 1) % LAZY_TERMS == 0 {
                    acc.iter_mut()
                        .for_each(|a| *a = bj.lazy_reduce_u128(*a) as u128);
                }
            }
            izip!(out_j.iter_mut(), acc.iter()).for_each(|(o, a)| *o = bj.reduce_u128(*a));
        }
        Ok(())
    }
}
