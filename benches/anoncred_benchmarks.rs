// Copyright 2025 The anoncred Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anoncred::kdf::{self, Kdf};
use anoncred::voprf;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::thread_rng;

fn test_attributes() -> Vec<Vec<u8>> {
    vec![b"app:benchmark".to_vec(), b"2024-01".to_vec()]
}

fn benchmark_derive_key_pair(c: &mut Criterion) {
    let mut rng = thread_rng();
    let kdf = Kdf::generate(&mut rng);
    let attributes = test_attributes();

    c.bench_function("derive_key_pair", |b| {
        b.iter(|| {
            let _derived = kdf.derive_key_pair(black_box(&attributes), &mut rng).unwrap();
        });
    });
}

fn benchmark_verify_public_key(c: &mut Criterion) {
    let mut rng = thread_rng();
    let kdf = Kdf::generate(&mut rng);
    let attributes = test_attributes();
    let derived = kdf.derive_key_pair(&attributes, &mut rng).unwrap();

    c.bench_function("verify_public_key", |b| {
        b.iter(|| {
            let _ok = kdf::verify_public_key(
                black_box(kdf.primary_public_key()),
                black_box(&derived.public_key),
                black_box(&attributes),
                black_box(&derived.proof),
            );
        });
    });
}

fn benchmark_blind(c: &mut Criterion) {
    let mut rng = thread_rng();
    let token = [0x42u8; 32];

    c.bench_function("blind", |b| {
        b.iter(|| {
            let _blinding = voprf::blind(black_box(&token), &mut rng).unwrap();
        });
    });
}

fn benchmark_evaluate_with_proof(c: &mut Criterion) {
    let mut rng = thread_rng();
    let (sk, _pk) = voprf::setup(&mut rng);
    let token = [0x42u8; 32];
    let blinding = voprf::blind(&token, &mut rng).unwrap();

    c.bench_function("evaluate_with_proof", |b| {
        b.iter(|| {
            let (_evaluated, _proof) =
                voprf::evaluate_with_proof(black_box(&sk), black_box(&blinding.blinded), &mut rng);
        });
    });
}

fn benchmark_verifiable_unblind(c: &mut Criterion) {
    let mut rng = thread_rng();
    let (sk, pk) = voprf::setup(&mut rng);
    let token = [0x42u8; 32];
    let blinding = voprf::blind(&token, &mut rng).unwrap();
    let (evaluated, proof) = voprf::evaluate_with_proof(&sk, &blinding.blinded, &mut rng);

    c.bench_function("verifiable_unblind", |b| {
        b.iter(|| {
            let _unblinded = voprf::verifiable_unblind(
                black_box(&evaluated),
                black_box(&proof),
                black_box(&blinding),
                black_box(&pk),
            )
            .unwrap();
        });
    });
}

fn benchmark_finalize(c: &mut Criterion) {
    let mut rng = thread_rng();
    let (sk, _pk) = voprf::setup(&mut rng);
    let token = [0x42u8; 32];

    c.bench_function("server_finalize", |b| {
        b.iter(|| {
            let _secret = voprf::server_finalize(black_box(&sk), black_box(&token));
        });
    });
}

criterion_group!(
    benches,
    benchmark_derive_key_pair,
    benchmark_verify_public_key,
    benchmark_blind,
    benchmark_evaluate_with_proof,
    benchmark_verifiable_unblind,
    benchmark_finalize
);

criterion_main!(benches);
