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

//! Anonymous credential core
//!
//! A verifiable oblivious pseudorandom function (VOPRF) over Ristretto255,
//! an attribute-indexed key-derivation function, and the discrete-log
//! equality proofs tying them together. A server can issue and verify
//! credentials that a client redeems without the server being able to link
//! issuance to redemption.
//!
//! # Overview
//!
//! The server holds one long-lived primary key pair. For each ordered list
//! of attributes (say, an application id and an epoch) it derives an
//! attribute key pair on demand, and proves to clients that the derived
//! public key descends from the published primary key. Credentials are
//! signed blindly under the attribute key: the client hashes a random
//! token into the group, blinds it with a fresh scalar, and the server
//! evaluates the PRF on the blinded element with a proof of correct
//! evaluation. After unblinding, the client holds a `(token, shared
//! secret)` pair the server can recompute. The server has never seen the
//! token, so it cannot connect the redemption back to the signing request.
//!
//! # Example
//!
//! ```
//! use anoncred::client::Client;
//! use anoncred::kdf::Kdf;
//! use anoncred::server::{CallerIdentity, CredentialService};
//! use rand_core::OsRng;
//!
//! let mut rng = OsRng;
//!
//! // Server bootstrap: one primary key pair for the process lifetime.
//! let service = CredentialService::new(Kdf::generate(&mut rng));
//! let attributes = vec![b"app:demo".to_vec(), b"2024-01".to_vec()];
//!
//! // The client fetches the attribute key and checks its lineage proof.
//! let client = Client::new(&service.primary_public_key()).unwrap();
//! let issued = service.public_key_and_proof(&attributes, &mut rng).unwrap();
//! let attribute_key = client
//!     .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
//!     .unwrap();
//!
//! // Issuance: blind a fresh token, have the server sign it, unblind.
//! let pending = client.begin_issuance(&mut rng).unwrap();
//! let caller = CallerIdentity::new("issuer-gateway");
//! let signed = service
//!     .sign_credential(&caller, &pending.blinded_bytes(), &attributes, &mut rng)
//!     .unwrap();
//! let credential = pending
//!     .finish(&attribute_key, &signed.evaluated, &signed.proof)
//!     .unwrap();
//!
//! // Redemption: the server recomputes the shared secret from the token.
//! service
//!     .redeem_credential(&credential.token, credential.shared_secret.as_bytes(), &attributes)
//!     .unwrap();
//! ```
//!
//! # Protocol flow
//!
//! 1. Server derives the attribute key with [`kdf::Kdf::derive_key_pair`]
//! 2. Client checks the key proof with [`client::Client::verify_attribute_key`]
//! 3. Client blinds a token with [`client::Client::begin_issuance`]
//! 4. Server signs with [`server::CredentialService::sign_credential`]
//! 5. Client unblinds and finalizes with [`client::PendingCredential::finish`]
//! 6. Server checks redemption with [`server::CredentialService::redeem_credential`]
//!
//! Redemption asserts cryptographic validity only; double-spend
//! deduplication belongs to the embedding service.

pub mod client;
pub mod config;
pub mod dleq;
pub mod errors;
pub mod group;
pub mod kdf;
mod metrics;
pub mod server;
pub mod voprf;

pub use client::{Client, Credential, PendingCredential};
pub use dleq::DleqProof;
pub use errors::{Error, Result};
pub use kdf::Kdf;
pub use server::{Authenticator, CallerIdentity, CredentialService};
pub use voprf::SharedSecret;
