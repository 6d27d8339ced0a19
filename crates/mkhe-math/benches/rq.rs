#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mkhe_math::{
    rns::BasisExtender,
    rq::{Context, Poly, Representation, SubstitutionExponent},
};
use ndarray::Array2;
use rand::thread_rng;
use std::{sync::Arc, time::Duration};

static MODULI: &[u64; 4] = &[
    562949954093057,
    4611686018326724609,
    4611686018309947393,
    4611686018282684417,
];

static DEGREE: &[usize] = &[1024, 4096];

pub fn rq_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rq");
    group.warm_up_time(Duration::from_millis(100));
    group.measurement_time(Duration::from_secs(1));
    let mut rng = thread_rng();

    for degree in DEGREE {
        let ctx = Arc::new(Context::new(&MODULI[..2], *degree).unwrap());
        let p = Poly::random(&ctx, Representation::Ntt, &mut rng);
        let mut q = Poly::random(&ctx, Representation::Ntt, &mut rng);
        let mut q_shoup = q.clone();
        q_shoup.change_representation(Representation::NttShoup);
        let id = format!("{}/{}", degree, ctx.modulus().bits());

        group.bench_function(BenchmarkId::new("add", &id), |b| b.iter(|| q += &p));
        group.bench_function(BenchmarkId::new("mul", &id), |b| b.iter(|| q *= &p));
        group.bench_function(BenchmarkId::new("mul_shoup", &id), |b| {
            b.iter(|| q *= &q_shoup)
        });

        let e = SubstitutionExponent::new(*degree, 5).unwrap();
        group.bench_function(BenchmarkId::new("substitute", &id), |b| {
            b.iter(|| p.substitute(&e).unwrap())
        });

        group.bench_function(BenchmarkId::new("change_representation", &id), |b| {
            b.iter(|| {
                q.change_representation(Representation::PowerBasis);
                q.change_representation(Representation::Ntt);
            })
        });

        let extender = BasisExtender::new(&MODULI[..2], &MODULI[2..]).unwrap();
        let mut out = Array2::zeros((2, *degree));
        group.bench_function(BenchmarkId::new("basis_extend", &id), |b| {
            b.iter(|| extender.extend(p.coefficients(), out.view_mut()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(rq, rq_benchmark);
criterion_main!(rq);
