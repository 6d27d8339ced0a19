//! Implementation of operations over polynomials.

use super::{rows_mut, Poly, Representation};
use crate::{Error, Result};
use itertools::izip;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, p: &Poly) {
        assert_ne!(
            self.representation,
            Representation::NttShoup,
            "Cannot add to a polynomial in NttShoup representation"
        );
        assert_eq!(
            self.representation, p.representation,
            "Incompatible representations"
        );
        debug_assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        izip!(
            rows_mut(&mut self.coefficients),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(v1, v2, qi)| {
            izip!(v1.iter_mut(), v2.iter()).for_each(|(a, b)| *a = qi.add(*a, *b))
        });
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;
    fn add(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q += p;
        q
    }
}

impl Add for Poly {
    type Output = Poly;
    fn add(mut self, p: Poly) -> Poly {
        self += &p;
        self
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, p: &Poly) {
        assert_ne!(
            self.representation,
            Representation::NttShoup,
            "Cannot subtract from a polynomial in NttShoup representation"
        );
        assert_eq!(
            self.representation, p.representation,
            "Incompatible representations"
        );
        debug_assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        izip!(
            rows_mut(&mut self.coefficients),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(v1, v2, qi)| {
            izip!(v1.iter_mut(), v2.iter()).for_each(|(a, b)| *a = qi.sub(*a, *b))
        });
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;
    fn sub(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q -= p;
        q
    }
}

impl MulAssign<&Poly> for Poly {
    fn mul_assign(&mut self, p: &Poly) {
        assert_eq!(
            self.representation,
            Representation::Ntt,
            "Multiplication requires an Ntt representation."
        );
        debug_assert_eq!(self.ctx, p.ctx, "Incompatible contexts");

        match p.representation {
            Representation::Ntt => izip!(
                rows_mut(&mut self.coefficients),
                p.coefficients.outer_iter(),
                self.ctx.q.iter()
            )
            .for_each(|(v1, v2, qi)| {
                izip!(v1.iter_mut(), v2.iter()).for_each(|(a, b)| *a = qi.mul(*a, *b))
            }),
            Representation::NttShoup => {
                let shoup = p
                    .coefficients_shoup
                    .as_ref()
                    .expect("NttShoup polynomials carry their Shoup coefficients");
                izip!(
                    rows_mut(&mut self.coefficients),
                    p.coefficients.outer_iter(),
                    shoup.outer_iter(),
                    self.ctx.q.iter()
                )
                .for_each(|(v1, v2, v2_shoup, qi)| {
                    izip!(v1.iter_mut(), v2.iter(), v2_shoup.iter())
                        .for_each(|(a, b, b_shoup)| *a = qi.mul_shoup(*a, *b, *b_shoup))
                })
            }
            Representation::PowerBasis => {
                panic!("Multiplication requires a multipliand in Ntt or NttShoup representation.")
            }
        }
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;
    fn mul(self, p: &Poly) -> Poly {
        match self.representation {
            Representation::NttShoup => {
                // Swap the operands so that the Shoup precomputation is used.
                let mut q = p.clone();
                q *= self;
                q
            }
            _ => {
                let mut q = self.clone();
                q *= p;
                q
            }
        }
    }
}

impl Poly {
    /// Computes `self += a * b` coefficient-wise in Ntt representation.
    ///
    /// `b` may live in a context whose moduli extend the moduli of `self`, in
    /// which case only its leading residues are used.
    pub fn mul_add_assign(&mut self, a: &Poly, b: &Poly) -> Result<()> {
        self.ensure_representation(Representation::Ntt)?;
        a.ensure_representation(Representation::Ntt)?;
        if !b.representation.is_ntt() {
            return Err(Error::IncorrectRepresentation(
                b.representation,
                Representation::Ntt,
            ));
        }
        if a.ctx.moduli != self.ctx.moduli || !self.ctx.is_prefix_of(&b.ctx) {
            return Err(Error::InvalidContext);
        }

        match b.coefficients_shoup.as_ref() {
            Some(b_shoup) => izip!(
                rows_mut(&mut self.coefficients),
                a.coefficients.outer_iter(),
                b.coefficients.outer_iter(),
                b_shoup.outer_iter(),
                self.ctx.q.iter()
            )
            .for_each(|(acc, ai, bi, bi_shoup, qi)| {
                izip!(acc.iter_mut(), ai.iter(), bi.iter(), bi_shoup.iter()).for_each(
                    |(c, x, y, y_shoup)| *c = qi.add(*c, qi.mul_shoup(*x, *y, *y_shoup)),
                )
            }),
            None => izip!(
                rows_mut(&mut self.coefficients),
                a.coefficients.outer_iter(),
                b.coefficients.outer_iter(),
                self.ctx.q.iter()
            )
            .for_each(|(acc, ai, bi, qi)| {
                izip!(acc.iter_mut(), ai.iter(), bi.iter())
                    .for_each(|(c, x, y)| *c = qi.add(*c, qi.mul(*x, *y)))
            }),
        }
        Ok(())
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        let mut out = self.clone();
        if out.representation == Representation::NttShoup {
            out.change_representation(Representation::Ntt)
        }
        izip!(rows_mut(&mut out.coefficients), self.ctx.q.iter())
            .for_each(|(v, qi)| qi.neg_vec(v));
        out
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(mut self) -> Poly {
        if self.representation == Representation::NttShoup {
            self.change_representation(Representation::Ntt)
        }
        izip!(rows_mut(&mut self.coefficients), self.ctx.q.iter())
            .for_each(|(v, qi)| qi.neg_vec(v));
        self
    }
}
