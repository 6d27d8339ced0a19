#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mkhe_math::{
    ntt::NttOperator,
    zq::{primes::generate_primes, Modulus},
};
use rand::thread_rng;
use std::time::Duration;

// Bit sizes of the Q primes and of the P primes of the key switching chain.
static PRIME_BITS: &[usize] = &[50, 60];

static DEGREE: &[usize] = &[1024, 4096];

pub fn ntt_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ntt");
    group.warm_up_time(Duration::from_millis(100));
    group.measurement_time(Duration::from_secs(1));
    let mut rng = thread_rng();

    for degree in DEGREE {
        for bits in PRIME_BITS {
            let p = generate_primes(*bits, 2 * *degree as u64, 1, &[]).unwrap()[0];
            let q = Modulus::new(p).unwrap();
            let op = NttOperator::new(&q, *degree).unwrap();
            let mut a = q.random_vec(*degree, &mut rng);
            let id = format!("{degree}/{bits}");

            group.bench_function(BenchmarkId::new("forward", &id), |b| {
                b.iter(|| op.forward(&mut a))
            });
            group.bench_function(BenchmarkId::new("backward", &id), |b| {
                b.iter(|| op.backward(&mut a))
            });
            group.bench_function(BenchmarkId::new("round_trip", &id), |b| {
                b.iter(|| {
                    op.forward(&mut a);
                    op.backward(&mut a);
                })
            });
        }
    }

    group.finish();
}

criterion_group!(ntt, ntt_benchmark);
criterion_main!(ntt);
