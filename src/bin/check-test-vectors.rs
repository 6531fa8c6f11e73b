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

//! Replays the JSON test vectors produced by `generate-test-vectors` and
//! asserts every deterministic output, flagging any drift in the wire
//! format or domain-separation tags.

use anoncred::dleq::DleqProof;
use anoncred::group;
use anoncred::kdf::Kdf;
use anoncred::voprf::{self, Blinding};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct TestVector {
    procedure: String,
    args: BTreeMap<String, String>,
    output: BTreeMap<String, String>,
}

fn seeded_rng(seed_hex: &str) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(hex::decode(seed_hex).unwrap().try_into().unwrap())
}

fn scalar(hex_str: &str) -> curve25519_dalek::scalar::Scalar {
    let bytes: [u8; 32] = hex::decode(hex_str).unwrap().try_into().unwrap();
    group::decode_scalar(&bytes).unwrap()
}

fn element(hex_str: &str) -> curve25519_dalek::ristretto::RistrettoPoint {
    let bytes: [u8; 32] = hex::decode(hex_str).unwrap().try_into().unwrap();
    group::decode_element(&bytes).unwrap()
}

fn token(hex_str: &str) -> [u8; 32] {
    hex::decode(hex_str).unwrap().try_into().unwrap()
}

fn main() {
    let json_file = std::env::args().nth(1).unwrap_or("test_vectors.json".to_string());
    let test_vectors: Vec<TestVector> = serde_json::from_reader(
        std::fs::File::open(&json_file)
            .map_err(|e| format!("Failed to open file {}: {}", &json_file, e))
            .unwrap(),
    )
    .map_err(|e| format!("Failed to parse JSON: {}", e))
    .unwrap();

    for test_vector in &test_vectors {
        let procedure = test_vector.procedure.as_str();
        match procedure {
            "setup" => {
                let master_secret: [u8; 32] =
                    hex::decode(test_vector.args.get("master_secret").unwrap())
                        .unwrap()
                        .try_into()
                        .unwrap();
                let kdf = Kdf::from_raw_secret(&master_secret).unwrap();
                assert_eq!(
                    hex::encode(group::encode_element(kdf.primary_public_key())),
                    *test_vector.output.get("primary_public_key").unwrap()
                );
                println!("{}: OK", procedure);
            }
            "derive_key_pair" => {
                let master_secret = [0x01u8; 32];
                let kdf = Kdf::from_raw_secret(&master_secret).unwrap();
                let attributes: Vec<Vec<u8>> = test_vector
                    .args
                    .get("attributes")
                    .unwrap()
                    .split(',')
                    .map(|a| a.as_bytes().to_vec())
                    .collect();
                let mut rng = seeded_rng(test_vector.args.get("rng_seed").unwrap());
                let derived = kdf.derive_key_pair(&attributes, &mut rng).unwrap();
                assert_eq!(
                    hex::encode(group::encode_scalar(&derived.secret_key)),
                    *test_vector.output.get("secret_key").unwrap()
                );
                assert_eq!(
                    hex::encode(group::encode_element(&derived.public_key)),
                    *test_vector.output.get("public_key").unwrap()
                );
                // The pair is deterministic; the recorded proof must still
                // verify even though a replayed nonce will reproduce it.
                let proof =
                    DleqProof::decode(&hex::decode(test_vector.output.get("proof").unwrap()).unwrap())
                        .unwrap();
                assert!(anoncred::kdf::verify_public_key(
                    kdf.primary_public_key(),
                    &derived.public_key,
                    &attributes,
                    &proof
                ));
                println!("{}: OK", procedure);
            }
            "blind" => {
                let token = token(test_vector.args.get("token").unwrap());
                let mut rng = seeded_rng(test_vector.args.get("rng_seed").unwrap());
                let blinding = voprf::blind(&token, &mut rng).unwrap();
                assert_eq!(
                    hex::encode(group::encode_scalar(&blinding.factor)),
                    *test_vector.output.get("blinding_factor").unwrap()
                );
                assert_eq!(
                    hex::encode(group::encode_element(&blinding.blinded)),
                    *test_vector.output.get("blinded").unwrap()
                );
                println!("{}: OK", procedure);
            }
            "evaluate" => {
                let secret_key = scalar(test_vector.args.get("secret_key").unwrap());
                let blinded = element(test_vector.args.get("blinded").unwrap());
                let mut rng = seeded_rng(test_vector.args.get("rng_seed").unwrap());
                let (evaluated, proof) = voprf::evaluate_with_proof(&secret_key, &blinded, &mut rng);
                assert_eq!(
                    hex::encode(group::encode_element(&evaluated)),
                    *test_vector.output.get("evaluated").unwrap()
                );
                assert_eq!(
                    hex::encode(proof.to_bytes()),
                    *test_vector.output.get("proof").unwrap()
                );
                println!("{}: OK", procedure);
            }
            "unblind_finalize" => {
                let evaluated = element(test_vector.args.get("evaluated").unwrap());
                let proof =
                    DleqProof::decode(&hex::decode(test_vector.args.get("proof").unwrap()).unwrap())
                        .unwrap();
                let public_key = element(test_vector.args.get("public_key").unwrap());
                let token = token(test_vector.args.get("token").unwrap());

                // The blinded element is recomputed from the factor, which
                // keeps the vector self-contained.
                let factor = scalar(test_vector.args.get("blinding_factor").unwrap());
                let blinding =
                    Blinding { blinded: group::hash_to_group(&token) * factor, factor };
                let unblinded =
                    voprf::verifiable_unblind(&evaluated, &proof, &blinding, &public_key).unwrap();
                let shared_secret = voprf::client_finalize(&token, &unblinded);
                assert_eq!(
                    hex::encode(shared_secret.as_bytes()),
                    *test_vector.output.get("shared_secret").unwrap()
                );
                println!("{}: OK", procedure);
            }
            "server_finalize" => {
                let secret_key = scalar(test_vector.args.get("secret_key").unwrap());
                let token = token(test_vector.args.get("token").unwrap());
                let shared_secret = voprf::server_finalize(&secret_key, &token);
                assert_eq!(
                    hex::encode(shared_secret.as_bytes()),
                    *test_vector.output.get("shared_secret").unwrap()
                );
                println!("{}: OK", procedure);
            }
            _ => {
                println!("Ignoring procedure: {}", procedure);
            }
        }
    }
}
