//! Homomorphic operations on multi-key ciphertexts.

use crate::mkrlwe::{
    Ciphertext, ConjugationKeySet, CrsSlot, HoistedCiphertext, KeySwitcher, Parameters,
    RelinearizationKeySet, RotationKeySet,
};
use crate::{Error, Result};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheParametrized;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Evaluates additions, multiplications and automorphisms on ciphertexts of
/// any set of parties.
///
/// The in-place variants write into `out` at the level `out` already has,
/// which cannot exceed the level of any input. The `_new` variants allocate
/// their output at the lowest input level.
#[derive(Debug, Clone)]
pub struct Evaluator {
    par: Arc<Parameters>,
    ks: KeySwitcher,
}

impl FheParametrized for Evaluator {
    type Parameters = Parameters;

    fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }
}

/// Returns `level` if every input is at least at `level`.
fn check_level(level: usize, inputs: &[usize]) -> Result<usize> {
    let found = inputs.iter().copied().min().unwrap_or(level);
    if level > found {
        warn!(level, found, "output level above an input level");
        Err(Error::LevelMismatch {
            expected: level,
            found,
        })
    } else {
        Ok(level)
    }
}

impl Evaluator {
    /// Creates an evaluator.
    pub fn new(par: &Arc<Parameters>) -> Self {
        Self {
            par: par.clone(),
            ks: KeySwitcher::new(par),
        }
    }

    /// The key switcher used by this evaluator.
    pub fn key_switcher(&self) -> &KeySwitcher {
        &self.ks
    }

    /// Plaintext polynomial in Ntt representation at `level`.
    fn plaintext_at_level(&self, pt: &Poly, level: usize) -> Result<Poly> {
        let pt_level = self.par.level_of_ctx(pt.ctx())?;
        check_level(level, &[pt_level])?;
        let mut pt = pt.truncate(self.par.ctx_at_level(level)?)?;
        pt.change_representation(Representation::Ntt);
        Ok(pt)
    }

    fn dropped(&self, ct: &Ciphertext, level: usize) -> Result<Ciphertext> {
        self.ks.check_parameters(ct)?;
        let mut ct = ct.clone();
        ct.drop_to_level(level)?;
        Ok(ct)
    }

    fn add_or_sub(
        &self,
        ct0: &Ciphertext,
        ct1: &Ciphertext,
        level: usize,
        subtract: bool,
    ) -> Result<Ciphertext> {
        let level = check_level(level, &[ct0.level, ct1.level])?;
        let mut out = self.dropped(ct0, level)?;
        let ct1 = self.dropped(ct1, level)?;
        if subtract {
            out.common -= &ct1.common;
        } else {
            out.common += &ct1.common;
        }
        for (id, c) in ct1.parties() {
            if subtract {
                *out.entry(id) -= c;
            } else {
                *out.entry(id) += c;
            }
        }
        Ok(out)
    }

    /// Computes `out = ct0 + ct1`. The identity set of the sum is the union
    /// of the identity sets of the operands.
    pub fn add(&self, ct0: &Ciphertext, ct1: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
        *out = self.add_or_sub(ct0, ct1, out.level, false)?;
        Ok(())
    }

    /// Returns `ct0 + ct1`.
    pub fn add_new(&self, ct0: &Ciphertext, ct1: &Ciphertext) -> Result<Ciphertext> {
        self.add_or_sub(ct0, ct1, ct0.level.min(ct1.level), false)
    }

    /// Computes `out = ct0 - ct1`.
    pub fn sub(&self, ct0: &Ciphertext, ct1: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
        *out = self.add_or_sub(ct0, ct1, out.level, true)?;
        Ok(())
    }

    /// Returns `ct0 - ct1`.
    pub fn sub_new(&self, ct0: &Ciphertext, ct1: &Ciphertext) -> Result<Ciphertext> {
        self.add_or_sub(ct0, ct1, ct0.level.min(ct1.level), true)
    }

    /// Negates a ciphertext in place.
    pub fn neg(&self, ct: &mut Ciphertext) -> Result<()> {
        self.ks.check_parameters(ct)?;
        ct.common = -&ct.common;
        for (_, c) in ct.parties.iter_mut() {
            *c = -&*c;
        }
        Ok(())
    }

    /// Returns `-ct`.
    pub fn neg_new(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        let mut out = ct.clone();
        self.neg(&mut out)?;
        Ok(out)
    }

    fn plain_op(
        &self,
        ct: &Ciphertext,
        pt: &Poly,
        level: usize,
        op: fn(&mut Ciphertext, &Poly),
    ) -> Result<Ciphertext> {
        let level = check_level(level, &[ct.level])?;
        let pt = self.plaintext_at_level(pt, level)?;
        let mut out = self.dropped(ct, level)?;
        op(&mut out, &pt);
        Ok(out)
    }

    /// Computes `out = ct + pt`.
    pub fn add_plain(&self, ct: &Ciphertext, pt: &Poly, out: &mut Ciphertext) -> Result<()> {
        *out = self.plain_op(ct, pt, out.level, |c, p| c.common += p)?;
        Ok(())
    }

    /// Returns `ct + pt`.
    pub fn add_plain_new(&self, ct: &Ciphertext, pt: &Poly) -> Result<Ciphertext> {
        self.plain_op(ct, pt, ct.level, |c, p| c.common += p)
    }

    /// Computes `out = ct - pt`.
    pub fn sub_plain(&self, ct: &Ciphertext, pt: &Poly, out: &mut Ciphertext) -> Result<()> {
        *out = self.plain_op(ct, pt, out.level, |c, p| c.common -= p)?;
        Ok(())
    }

    /// Returns `ct - pt`.
    pub fn sub_plain_new(&self, ct: &Ciphertext, pt: &Poly) -> Result<Ciphertext> {
        self.plain_op(ct, pt, ct.level, |c, p| c.common -= p)
    }

    fn mul_by(ct: &mut Ciphertext, pt: &Poly) {
        ct.common *= pt;
        ct.parties.iter_mut().for_each(|(_, c)| *c *= pt);
    }

    /// Computes `out = ct · pt`. The identity set is unchanged.
    pub fn mul_plain(&self, ct: &Ciphertext, pt: &Poly, out: &mut Ciphertext) -> Result<()> {
        *out = self.plain_op(ct, pt, out.level, Self::mul_by)?;
        Ok(())
    }

    /// Returns `ct · pt`.
    pub fn mul_plain_new(&self, ct: &Ciphertext, pt: &Poly) -> Result<Ciphertext> {
        self.plain_op(ct, pt, ct.level, Self::mul_by)
    }

    /// Computes `out = ct0 · ct1`, relinearized with the keys of every party
    /// of both operands. `ct0` and `ct1` may be the same ciphertext.
    #[instrument(skip_all)]
    pub fn mul_and_relin(
        &self,
        ct0: &Ciphertext,
        ct1: &Ciphertext,
        rlks: &RelinearizationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[ct0.level, ct1.level])?;
        let h0 = self.ks.hoist(&self.dropped(ct0, level)?)?;
        *out = self.ks.mul_and_relin(&h0, ct1, rlks, level)?;
        Ok(())
    }

    /// Returns `ct0 · ct1` relinearized, at the lowest level of the operands.
    pub fn mul_and_relin_new(
        &self,
        ct0: &Ciphertext,
        ct1: &Ciphertext,
        rlks: &RelinearizationKeySet,
    ) -> Result<Ciphertext> {
        let mut out = Ciphertext::zero(&self.par, ct0.level.min(ct1.level))?;
        self.mul_and_relin(ct0, ct1, rlks, &mut out)?;
        Ok(out)
    }

    /// Computes `out = h0 · ct1` relinearized, reusing the digits of `h0`.
    #[instrument(skip_all)]
    pub fn mul_and_relin_hoisted(
        &self,
        h0: &HoistedCiphertext,
        ct1: &Ciphertext,
        rlks: &RelinearizationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[h0.level(), ct1.level])?;
        *out = self.ks.mul_and_relin(h0, ct1, rlks, level)?;
        Ok(())
    }

    /// Returns `h0 · ct1` relinearized, at the lowest level of the operands.
    pub fn mul_and_relin_hoisted_new(
        &self,
        h0: &HoistedCiphertext,
        ct1: &Ciphertext,
        rlks: &RelinearizationKeySet,
    ) -> Result<Ciphertext> {
        let mut out = Ciphertext::zero(&self.par, h0.level().min(ct1.level))?;
        self.mul_and_relin_hoisted(h0, ct1, rlks, &mut out)?;
        Ok(out)
    }

    /// Precomputes the digits of a ciphertext for the hoisted variants.
    pub fn hoist(&self, ct: &Ciphertext) -> Result<HoistedCiphertext> {
        self.ks.hoist(ct)
    }

    fn rotate_at_level(
        &self,
        h: &HoistedCiphertext,
        amount: usize,
        rtks: &RotationKeySet,
        level: usize,
    ) -> Result<Ciphertext> {
        self.ks.check_parameters(rtks)?;
        let amount = self.par.normalize_rotation(amount);
        if amount == 0 {
            return self.dropped(&h.ct, level);
        }
        let exponent = self.par.rotation_exponent(amount)?;
        self.ks.automorphism(
            h,
            &exponent,
            CrsSlot::Rotation(amount),
            |id| rtks.get_rotation(id, amount).map(|k| k.value.as_slice()),
            level,
        )
    }

    fn conjugate_at_level(
        &self,
        h: &HoistedCiphertext,
        cjks: &ConjugationKeySet,
        level: usize,
    ) -> Result<Ciphertext> {
        self.ks.check_parameters(cjks)?;
        let exponent = self.par.conjugation_exponent()?;
        self.ks.automorphism(
            h,
            &exponent,
            CrsSlot::Conjugation,
            |id| cjks.get(id).map(|k| k.value.as_slice()),
            level,
        )
    }

    /// Computes `out = σ_k(ct)`, which rotates the slots by `amount`
    /// positions, with the rotation keys of every party of `ct`.
    #[instrument(skip_all, fields(amount = amount))]
    pub fn rotate(
        &self,
        ct: &Ciphertext,
        amount: usize,
        rtks: &RotationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[ct.level])?;
        let h = self.ks.hoist(&self.dropped(ct, level)?)?;
        *out = self.rotate_at_level(&h, amount, rtks, level)?;
        Ok(())
    }

    /// Returns the rotation of `ct` by `amount` slots.
    pub fn rotate_new(
        &self,
        ct: &Ciphertext,
        amount: usize,
        rtks: &RotationKeySet,
    ) -> Result<Ciphertext> {
        let mut out = Ciphertext::zero(&self.par, ct.level)?;
        self.rotate(ct, amount, rtks, &mut out)?;
        Ok(out)
    }

    /// Computes `out = σ_k(h)` reusing the digits of `h`.
    #[instrument(skip_all, fields(amount = amount))]
    pub fn rotate_hoisted(
        &self,
        h: &HoistedCiphertext,
        amount: usize,
        rtks: &RotationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[h.level()])?;
        *out = self.rotate_at_level(h, amount, rtks, level)?;
        Ok(())
    }

    /// Returns the rotation of `h` by `amount` slots.
    pub fn rotate_hoisted_new(
        &self,
        h: &HoistedCiphertext,
        amount: usize,
        rtks: &RotationKeySet,
    ) -> Result<Ciphertext> {
        self.rotate_at_level(h, amount, rtks, h.level())
    }

    /// Returns one rotation of `h` per amount, sharing a single decomposition.
    #[instrument(skip_all, fields(amounts = amounts.len()))]
    pub fn rotate_hoisted_many(
        &self,
        h: &HoistedCiphertext,
        amounts: &[usize],
        rtks: &RotationKeySet,
    ) -> Result<Vec<Ciphertext>> {
        amounts
            .iter()
            .map(|k| self.rotate_at_level(h, *k, rtks, h.level()))
            .collect()
    }

    /// Computes `out = σ(ct)` for σ: x -> x^(2N - 1), which swaps the two
    /// halves of the slots, with the conjugation keys of every party of `ct`.
    #[instrument(skip_all)]
    pub fn conjugate(
        &self,
        ct: &Ciphertext,
        cjks: &ConjugationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[ct.level])?;
        let h = self.ks.hoist(&self.dropped(ct, level)?)?;
        *out = self.conjugate_at_level(&h, cjks, level)?;
        Ok(())
    }

    /// Returns the conjugation of `ct`.
    pub fn conjugate_new(&self, ct: &Ciphertext, cjks: &ConjugationKeySet) -> Result<Ciphertext> {
        let mut out = Ciphertext::zero(&self.par, ct.level)?;
        self.conjugate(ct, cjks, &mut out)?;
        Ok(out)
    }

    /// Computes `out = σ(h)` reusing the digits of `h`.
    #[instrument(skip_all)]
    pub fn conjugate_hoisted(
        &self,
        h: &HoistedCiphertext,
        cjks: &ConjugationKeySet,
        out: &mut Ciphertext,
    ) -> Result<()> {
        let level = check_level(out.level, &[h.level()])?;
        *out = self.conjugate_at_level(h, cjks, level)?;
        Ok(())
    }

    /// Returns the conjugation of `h`.
    pub fn conjugate_hoisted_new(
        &self,
        h: &HoistedCiphertext,
        cjks: &ConjugationKeySet,
    ) -> Result<Ciphertext> {
        self.conjugate_at_level(h, cjks, h.level())
    }
}
