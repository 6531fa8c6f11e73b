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

//! Emits deterministic test vectors for every protocol procedure as JSON.
//! The companion `check-test-vectors` binary replays them; together they
//! pin the wire format and domain-separation tags across versions.

use anoncred::group;
use anoncred::kdf::Kdf;
use anoncred::voprf;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct TestVector {
    procedure: &'static str,
    args: BTreeMap<&'static str, String>,
    output: BTreeMap<&'static str, String>,
}

fn seeded_rng(seed_hex: &str) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(hex::decode(seed_hex).unwrap().try_into().unwrap())
}

fn main() {
    let mut test_vectors = vec![];

    // Setup from a fixed raw master secret.
    let master_secret = [0x01u8; 32];
    let kdf = Kdf::from_raw_secret(&master_secret).unwrap();
    test_vectors.push(TestVector {
        procedure: "setup",
        args: BTreeMap::from([("master_secret", hex::encode(master_secret))]),
        output: BTreeMap::from([(
            "primary_public_key",
            hex::encode(group::encode_element(kdf.primary_public_key())),
        )]),
    });

    // Derive the attribute key pair. The pair is deterministic; the proof
    // nonce comes from the seeded RNG.
    let attributes = vec![b"app:demo".to_vec(), b"2024-01".to_vec()];
    let rng_seed = "0101010101010101010101010101010101010101010101010101010101010101";
    let mut rng = seeded_rng(rng_seed);
    let derived = kdf.derive_key_pair(&attributes, &mut rng).unwrap();
    test_vectors.push(TestVector {
        procedure: "derive_key_pair",
        args: BTreeMap::from([
            ("rng_seed", rng_seed.to_string()),
            ("attributes", "app:demo,2024-01".to_string()),
        ]),
        output: BTreeMap::from([
            ("secret_key", hex::encode(group::encode_scalar(&derived.secret_key))),
            ("public_key", hex::encode(group::encode_element(&derived.public_key))),
            ("proof", hex::encode(derived.proof.to_bytes())),
        ]),
    });

    // Blind a fixed token.
    let mut token = [0u8; 32];
    token[31] = 1;
    let rng_seed = "0202020202020202020202020202020202020202020202020202020202020202";
    let mut rng = seeded_rng(rng_seed);
    let blinding = voprf::blind(&token, &mut rng).unwrap();
    test_vectors.push(TestVector {
        procedure: "blind",
        args: BTreeMap::from([("rng_seed", rng_seed.to_string()), ("token", hex::encode(token))]),
        output: BTreeMap::from([
            ("blinding_factor", hex::encode(group::encode_scalar(&blinding.factor))),
            ("blinded", hex::encode(group::encode_element(&blinding.blinded))),
        ]),
    });

    // Evaluate under the attribute key, with the evaluation proof.
    let rng_seed = "0303030303030303030303030303030303030303030303030303030303030303";
    let mut rng = seeded_rng(rng_seed);
    let (evaluated, evaluation_proof) =
        voprf::evaluate_with_proof(&derived.secret_key, &blinding.blinded, &mut rng);
    test_vectors.push(TestVector {
        procedure: "evaluate",
        args: BTreeMap::from([
            ("rng_seed", rng_seed.to_string()),
            ("secret_key", hex::encode(group::encode_scalar(&derived.secret_key))),
            ("blinded", hex::encode(group::encode_element(&blinding.blinded))),
        ]),
        output: BTreeMap::from([
            ("evaluated", hex::encode(group::encode_element(&evaluated))),
            ("proof", hex::encode(evaluation_proof.to_bytes())),
        ]),
    });

    // Unblind and finalize on the client.
    let unblinded = voprf::verifiable_unblind(
        &evaluated,
        &evaluation_proof,
        &blinding,
        &derived.public_key,
    )
    .unwrap();
    let shared_secret = voprf::client_finalize(&token, &unblinded);
    test_vectors.push(TestVector {
        procedure: "unblind_finalize",
        args: BTreeMap::from([
            ("evaluated", hex::encode(group::encode_element(&evaluated))),
            ("proof", hex::encode(evaluation_proof.to_bytes())),
            ("blinding_factor", hex::encode(group::encode_scalar(&blinding.factor))),
            ("public_key", hex::encode(group::encode_element(&derived.public_key))),
            ("token", hex::encode(token)),
        ]),
        output: BTreeMap::from([("shared_secret", hex::encode(shared_secret.as_bytes()))]),
    });

    // Finalize on the server directly from the token.
    let server_secret = voprf::server_finalize(&derived.secret_key, &token);
    assert_eq!(shared_secret, server_secret);
    test_vectors.push(TestVector {
        procedure: "server_finalize",
        args: BTreeMap::from([
            ("secret_key", hex::encode(group::encode_scalar(&derived.secret_key))),
            ("token", hex::encode(token)),
        ]),
        output: BTreeMap::from([("shared_secret", hex::encode(server_secret.as_bytes()))]),
    });

    println!("{}", serde_json::to_string_pretty(&test_vectors).unwrap());
}
