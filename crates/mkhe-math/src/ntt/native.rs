use crate::zq::Modulus;
use itertools::{izip, Itertools};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::iter::successors;

/// Number-Theoretic Transform operator for the negacyclic ring
/// ZZ_p\[x\] / (x^size + 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttOperator {
    p: Modulus,
    p_twice: u64,
    size: usize,
    omegas: Box<[u64]>,
    omegas_shoup: Box<[u64]>,
    zetas_inv: Box<[u64]>,
    zetas_inv_shoup: Box<[u64]>,
    size_inv: u64,
    size_inv_shoup: u64,
}

impl NttOperator {
    /// Create an NTT operator given a modulus for a specific size.
    ///
    /// Returns None if the modulus does not support the NTT for this specific
    /// size.
    pub fn new(p: &Modulus, size: usize) -> Option<Self> {
        if !super::supports_ntt(p.p, size) {
            return None;
        }

        let size_inv = p.inv(size as u64)?;
        let omega = Self::primitive_root(size, p)?;
        let omega_inv = p.inv(omega)?;

        let powers = successors(Some(1u64), |x| Some(p.mul(*x, omega)))
            .take(size)
            .collect_vec();
        let powers_inv = successors(Some(omega_inv), |x| Some(p.mul(*x, omega_inv)))
            .take(size)
            .collect_vec();

        let shift = size.leading_zeros() + 1;
        let (omegas, zetas_inv): (Vec<u64>, Vec<u64>) = (0..size)
            .map(|i| {
                let j = i.reverse_bits() >> shift;
                (powers[j], powers_inv[j])
            })
            .unzip();

        Some(Self {
            p: p.clone(),
            p_twice: p.p * 2,
            size,
            omegas_shoup: p.shoup_vec(&omegas).into_boxed_slice(),
            omegas: omegas.into_boxed_slice(),
            zetas_inv_shoup: p.shoup_vec(&zetas_inv).into_boxed_slice(),
            zetas_inv: zetas_inv.into_boxed_slice(),
            size_inv,
            size_inv_shoup: p.shoup(size_inv),
        })
    }

    /// Size of the transform.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn forward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut k = 1;
        let mut half = self.size >> 1;
        while half > 0 {
            for block in a.chunks_exact_mut(2 * half) {
                let (w, w_shoup) = (self.omegas[k], self.omegas_shoup[k]);
                k += 1;
                let (lo, hi) = block.split_at_mut(half);
                izip!(lo.iter_mut(), hi.iter_mut())
                    .for_each(|(x, y)| self.butterfly(x, y, w, w_shoup));
            }
            half >>= 1;
        }

        a.iter_mut().for_each(|ai| *ai = self.reduce3(*ai));
    }

    /// Compute the backward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn backward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut k = 0;
        let mut half = 1;
        while half < self.size {
            for block in a.chunks_exact_mut(2 * half) {
                let (z, z_shoup) = (self.zetas_inv[k], self.zetas_inv_shoup[k]);
                k += 1;
                let (lo, hi) = block.split_at_mut(half);
                izip!(lo.iter_mut(), hi.iter_mut())
                    .for_each(|(x, y)| self.inv_butterfly(x, y, z, z_shoup));
            }
            half <<= 1;
        }

        a.iter_mut()
            .for_each(|ai| *ai = self.p.mul_shoup(*ai, self.size_inv, self.size_inv_shoup));
    }

    /// Reduce a modulo p.
    ///
    /// Aborts if a >= 4 * p in debug mode.
    const fn reduce3(&self, a: u64) -> u64 {
        debug_assert!(a < 4 * self.p.p);

        let y = Modulus::reduce1(a, self.p_twice);
        Modulus::reduce1(y, self.p.p)
    }

    /// NTT Butterfly, with inputs and outputs in [0, 4p).
    fn butterfly(&self, x: &mut u64, y: &mut u64, w: u64, w_shoup: u64) {
        debug_assert!(*x < 4 * self.p.p);
        debug_assert!(*y < 4 * self.p.p);

        *x = Modulus::reduce1(*x, self.p_twice);
        let t = self.p.lazy_mul_shoup(*y, w, w_shoup);
        *y = *x + self.p_twice - t;
        *x += t;
    }

    /// Inverse NTT butterfly, with inputs and outputs in [0, 2p).
    fn inv_butterfly(&self, x: &mut u64, y: &mut u64, z: u64, z_shoup: u64) {
        debug_assert!(*x < self.p_twice);
        debug_assert!(*y < self.p_twice);

        let t = *x;
        *x = Modulus::reduce1(*y + t, self.p_twice);
        *y = self.p.lazy_mul_shoup(self.p_twice + t - *y, z, z_shoup);
    }

    /// Returns a 2n-th primitive root modulo p, found by a deterministic search.
    fn primitive_root(n: usize, p: &Modulus) -> Option<u64> {
        let lambda = (p.p - 1) / (2 * n as u64);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        (0..100)
            .map(|_| p.pow(rng.gen_range(0..p.p), lambda))
            .find(|root| Self::is_primitive_root(*root, 2 * n, p))
    }

    /// Returns whether a is a n-th primitive root of unity, for n a power of 2.
    fn is_primitive_root(a: u64, n: usize, p: &Modulus) -> bool {
        (p.pow(a, n as u64) == 1) && (p.pow(a, (n / 2) as u64) != 1)
    }
}
