#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mkhe::mkrlwe::{
    Ciphertext, Encryptor, Evaluator, KeyGenerator, ParametersBuilder, PartyId,
    RelinearizationKeySet, RotationKeySet,
};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheEncrypter;
use rand::thread_rng;
use std::time::Duration;

static PARTIES: &[u16] = &[2, 4, 8];

pub fn mkhe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mkhe");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(100));
    group.measurement_time(Duration::from_secs(1));
    let mut rng = thread_rng();

    let par = ParametersBuilder::new()
        .set_degree(1024)
        .set_moduli_sizes(&[50, 50, 50])
        .set_p_moduli_sizes(&[60, 60, 60])
        .set_rotations(&[1, 2, 3, 4])
        .build_arc()
        .unwrap();
    let kg = KeyGenerator::new(&par);
    let ev = Evaluator::new(&par);
    let pt = Poly::random(
        par.ctx_at_level(par.max_level()).unwrap(),
        Representation::Ntt,
        &mut rng,
    );

    group.bench_function("gen_party_keys", |b| {
        b.iter(|| kg.gen_party_keys(PartyId::new(0), &mut rng).unwrap())
    });

    for count in PARTIES {
        let mut rlks = RelinearizationKeySet::new(&par);
        let mut rtks = RotationKeySet::new(&par);
        let mut ct = Ciphertext::zero(&par, par.max_level()).unwrap();
        for i in 0..*count {
            let keys = kg.gen_party_keys(PartyId::new(i), &mut rng).unwrap();
            let share = Encryptor::new(&keys.public)
                .try_encrypt(&pt, &mut rng)
                .unwrap();
            ct = ev.add_new(&ct, &share).unwrap();
            rlks.insert(keys.relinearization).unwrap();
            for rtk in keys.rotations {
                rtks.insert(rtk).unwrap();
            }
        }

        group.bench_function(BenchmarkId::new("mul_and_relin", count), |b| {
            b.iter(|| ev.mul_and_relin_new(&ct, &ct, &rlks).unwrap())
        });

        group.bench_function(BenchmarkId::new("hoist", count), |b| {
            b.iter(|| ev.hoist(&ct).unwrap())
        });

        let h = ev.hoist(&ct).unwrap();
        group.bench_function(BenchmarkId::new("rotate", count), |b| {
            b.iter(|| ev.rotate_new(&ct, 1, &rtks).unwrap())
        });
        group.bench_function(BenchmarkId::new("rotate_hoisted_many", count), |b| {
            b.iter(|| ev.rotate_hoisted_many(&h, &[1, 2, 3, 4], &rtks).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, mkhe_benchmark);
criterion_main!(benches);
