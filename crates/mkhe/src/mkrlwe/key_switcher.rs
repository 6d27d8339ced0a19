//! Key switching: internal and external products, multi-key relinearization
//! and Galois automorphisms.

use crate::mkrlwe::{
    Ciphertext, CrsSlot, HoistedCiphertext, Parameters, PartyId, QpPoly, RelinearizationKeySet,
};
use crate::{Error, Result};
use itertools::Itertools;
use mkhe_math::rq::{Poly, Representation, SubstitutionExponent};
use mkhe_traits::FheParametrized;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Performs the key switching operations for fixed parameters.
///
/// The switcher holds no scratch state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct KeySwitcher {
    par: Arc<Parameters>,
}

impl FheParametrized for KeySwitcher {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

impl KeySwitcher {
    /// Creates a key switcher.
    pub fn new(par: &Arc<Parameters>) -> Self {
        Self { par: par.clone() }
    }

    pub(crate) fn check_parameters<T: FheParametrized<Parameters = Parameters>>(
        &self,
        value: &T,
    ) -> Result<()> {
        if self.par.same_as(value.parameters()) {
            Ok(())
        } else {
            Err(Error::ConfigError(
                "Operands were created for other parameters".to_string(),
            ))
        }
    }

    /// Gadget decomposition of a polynomial in Ntt representation.
    pub fn decompose(&self, a: &Poly) -> Result<Vec<QpPoly>> {
        self.par.gadget().decompose(a)
    }

    /// Computes ModDown(<h(a), key>), where h is the gadget decomposition.
    pub fn internal_product(&self, a: &Poly, key: &[QpPoly]) -> Result<Poly> {
        let digits = self.decompose(a)?;
        self.external_product(&digits, key)
    }

    /// Computes ModDown(<digits, key>) for digits decomposed beforehand.
    pub fn external_product(&self, digits: &[QpPoly], key: &[QpPoly]) -> Result<Poly> {
        let gadget = self.par.gadget();
        gadget.mod_down(&gadget.inner_product(digits, key)?)
    }

    /// Computes Σ_id h(c_id)⊙k_id over the party components of `h`, where k_id
    /// is the gadget vector returned by `keys`.
    fn scale_and_sum<'k, F>(
        &self,
        h: &HoistedCiphertext,
        keys: F,
        zero: &QpPoly,
        level: usize,
    ) -> Result<Vec<QpPoly>>
    where
        F: Fn(PartyId) -> Result<&'k [QpPoly]> + Sync,
    {
        let gadget = self.par.gadget();
        let scaled = h
            .components()
            .collect_vec()
            .into_par_iter()
            .map(|(id, digits)| -> Result<Vec<QpPoly>> {
                gadget.scale_vector(digits, keys(id)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(scaled.into_iter().fold(
            vec![zero.clone(); gadget.digit_count(level)],
            |mut acc, v| {
                acc.iter_mut().zip(v.iter()).for_each(|(a, b)| *a += b);
                acc
            },
        ))
    }

    /// Precomputes the gadget decomposition of every party component.
    #[instrument(skip_all)]
    pub fn hoist(&self, ct: &Ciphertext) -> Result<HoistedCiphertext> {
        self.check_parameters(ct)?;
        debug!(level = ct.level, parties = ct.party_count(), "hoisting");
        HoistedCiphertext::new(ct)
    }

    /// Multiplies the hoisted `h0` by `ct1` and relinearizes the product at
    /// `level` with a number of key switchings linear in the number of
    /// parties.
    pub(crate) fn mul_and_relin(
        &self,
        h0: &HoistedCiphertext,
        ct1: &Ciphertext,
        rlks: &RelinearizationKeySet,
        level: usize,
    ) -> Result<Ciphertext> {
        self.check_parameters(h0)?;
        self.check_parameters(ct1)?;
        self.check_parameters(rlks)?;
        let h0 = h0.at_level(level)?;
        let mut ct1 = ct1.clone();
        ct1.drop_to_level(level)?;

        let gadget = self.par.gadget();
        let ctx = self.par.ctx_at_level(level)?;
        let ctx_p = self.par.ctx_p();
        let u = self.par.crs().get(CrsSlot::Universal)?;
        let ct0 = &h0.ct;
        let s0 = ct0.identity_set();
        let s1 = ct1.identity_set();
        debug!(level, s0 = s0.len(), s1 = s1.len(), "relinearizing");

        // Tensor product.
        let mut out = Ciphertext::zero(&self.par, level)?;
        out.common = &ct0.common * &ct1.common;
        for (id, c1) in ct1.parties() {
            *out.entry(id) += &(&ct0.common * c1);
        }
        for (id, c0) in ct0.parties() {
            *out.entry(id) += &(c0 * &ct1.common);
        }

        // Digits of the party components of ct1.
        let h1 = HoistedCiphertext::new(&ct1)?;
        let zero = QpPoly::zero(ctx, ctx_p);

        // x = Σ_{i∈S0} h(c0_i)⊙d_i, a gadget vector of Σ_i c0_i·s_i.
        let x = self.scale_and_sum(&h0, |id| Ok(rlks.get(id)?.d.as_slice()), &zero, level)?;

        // Every j∈S1 gains ModDown(<h(c1_j), x>).
        let cross = h1
            .components()
            .collect_vec()
            .into_par_iter()
            .map(|(id, digits)| -> Result<(PartyId, Poly)> {
                Ok((id, self.external_product(digits, &x)?))
            })
            .collect::<Result<Vec<_>>>()?;
        for (id, c) in cross {
            *out.entry(id) += &c;
        }

        // y = Σ_{j∈S1} h(c1_j)⊙b_j, a gadget vector of 0 masked by -Σ_j c1_j·s_j.
        let y = self.scale_and_sum(&h1, |id| Ok(rlks.get(id)?.b.as_slice()), &zero, level)?;

        // For i∈S0, z_i = ModDown(<h(c0_i), y>) is decomposed once and switched
        // by v_i into the common component and by u into the component of i.
        let closing = h0
            .components()
            .collect_vec()
            .into_par_iter()
            .map(|(id, digits)| -> Result<(PartyId, QpPoly, Poly)> {
                let z = gadget.mod_down(&gadget.inner_product(digits, &y)?)?;
                let hz = gadget.decompose(&z)?;
                let to_common = gadget.inner_product(&hz, &rlks.get(id)?.v)?;
                let to_own = self.external_product(&hz, u)?;
                Ok((id, to_common, to_own))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut to_common = QpPoly::zero(ctx, ctx_p);
        for (id, common, own) in closing {
            to_common += &common;
            *out.entry(id) += &own;
        }
        out.common += &gadget.mod_down(&to_common)?;

        Ok(out)
    }

    /// Applies the automorphism x -> x^exponent to the hoisted ciphertext and
    /// switches back to the original keys: the common component becomes
    /// σ(c_0) + Σ_i ModDown(<σ(h(c_i)), k_i>) and the component of i becomes
    /// ModDown(<σ(h(c_i)), m>), where k_i is the key of i and m the masks of
    /// `slot`.
    pub(crate) fn automorphism<'k, F>(
        &self,
        h: &HoistedCiphertext,
        exponent: &SubstitutionExponent,
        slot: CrsSlot,
        keys: F,
        level: usize,
    ) -> Result<Ciphertext>
    where
        F: Fn(PartyId) -> Result<&'k [QpPoly]> + Sync,
    {
        self.check_parameters(h)?;
        let h = h.at_level(level)?;
        let gadget = self.par.gadget();
        let masks = self.par.crs().get(slot)?;
        let ctx = self.par.ctx_at_level(level)?;
        debug!(level, parties = h.ct.party_count(), %slot, "switching automorphism");

        let switched = h
            .components()
            .collect_vec()
            .into_par_iter()
            .map(|(id, digits)| -> Result<(PartyId, QpPoly, Poly)> {
                let key = keys(id)?;
                let rotated = digits
                    .iter()
                    .map(|d| d.substitute(exponent))
                    .collect::<Result<Vec<_>>>()?;
                let to_common = gadget.inner_product(&rotated, key)?;
                let own = self.external_product(&rotated, masks)?;
                Ok((id, to_common, own))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = Ciphertext::zero(&self.par, level)?;
        let mut to_common = QpPoly::zero(ctx, self.par.ctx_p());
        for (id, common, own) in switched {
            to_common += &common;
            *out.entry(id) = own;
        }
        out.common = h.ct.common.substitute(exponent)?;
        out.common += &gadget.mod_down(&to_common)?;
        debug_assert_eq!(out.common.representation(), &Representation::Ntt);
        Ok(out)
    }
}
