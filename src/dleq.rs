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

//! Non-interactive discrete-log-equality proofs.
//!
//! A [`DleqProof`] witnesses that two element pairs share an exponent:
//! `log_G(Y) = log_H(Z)`. The protocol is Chaum-Pedersen with a Fiat-Shamir
//! transform. The same verifier backs both the VOPRF evaluation proof and
//! the KDF attribute-key proof.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::errors::{Error, Result};
use crate::group::{self, DLEQ_CHALLENGE_DOMAIN, SCALAR_SIZE};

/// A transcript for the Fiat-Shamir transform.
///
/// Elements are added with labels; labels and encodings are length-prefixed,
/// and the domain separator is applied when the challenge is generated. The
/// statement elements must be appended in a fixed order: a reordered
/// transcript silently breaks soundness against adaptive provers.
#[derive(Clone)]
pub(crate) struct Transcript {
    hasher: Sha512,
}

impl Transcript {
    pub(crate) fn new() -> Self {
        Self { hasher: Sha512::new() }
    }

    /// Add a group element to the transcript.
    pub(crate) fn append_element(&mut self, label: &[u8], element: &RistrettoPoint) {
        let encoded = element.compress();
        self.hasher.update((label.len() as u16).to_be_bytes());
        self.hasher.update(label);
        self.hasher.update((encoded.as_bytes().len() as u16).to_be_bytes());
        self.hasher.update(encoded.as_bytes());
    }

    /// Generate a challenge scalar with domain separation.
    pub(crate) fn challenge(&self, domain_separator: &str) -> Scalar {
        let mut hasher = self.hasher.clone();
        hasher.update((domain_separator.len() as u16).to_be_bytes());
        hasher.update(domain_separator.as_bytes());
        Scalar::from_hash(hasher)
    }
}

/// A discrete-log-equality proof: Fiat-Shamir challenge and response.
#[derive(Clone, Debug)]
pub struct DleqProof {
    pub c: Scalar,
    pub s: Scalar,
}

/// Encoded width of a proof: `c || s`.
pub const PROOF_SIZE: usize = 2 * SCALAR_SIZE;

impl DleqProof {
    /// Encode the proof as `c || s` and append it to a byte vector.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&group::encode_scalar(&self.c));
        out.extend_from_slice(&group::encode_scalar(&self.s));
    }

    /// Encode the proof as a fixed 64-byte array.
    pub fn to_bytes(&self) -> [u8; PROOF_SIZE] {
        let mut out = [0u8; PROOF_SIZE];
        out[..SCALAR_SIZE].copy_from_slice(&group::encode_scalar(&self.c));
        out[SCALAR_SIZE..].copy_from_slice(&group::encode_scalar(&self.s));
        out
    }

    /// Decode a proof, rejecting non-canonical scalar bytes.
    pub fn decode(input: &[u8]) -> Result<Self> {
        if input.len() != PROOF_SIZE {
            return Err(Error::InvalidEncoding);
        }
        let mut c_bytes = [0u8; SCALAR_SIZE];
        let mut s_bytes = [0u8; SCALAR_SIZE];
        c_bytes.copy_from_slice(&input[..SCALAR_SIZE]);
        s_bytes.copy_from_slice(&input[SCALAR_SIZE..]);
        Ok(Self {
            c: group::decode_scalar(&c_bytes)?,
            s: group::decode_scalar(&s_bytes)?,
        })
    }
}

impl PartialEq for DleqProof {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.c.ct_eq(&other.c) & self.s.ct_eq(&other.s))
    }
}

impl Eq for DleqProof {}

/// Build the challenge over the statement and commitments, in the fixed
/// order `G, H, Y, Z, A, B`.
fn challenge(
    g: &RistrettoPoint,
    h: &RistrettoPoint,
    y: &RistrettoPoint,
    z: &RistrettoPoint,
    a: &RistrettoPoint,
    b: &RistrettoPoint,
) -> Scalar {
    let mut transcript = Transcript::new();
    transcript.append_element(b"G", g);
    transcript.append_element(b"H", h);
    transcript.append_element(b"Y", y);
    transcript.append_element(b"Z", z);
    transcript.append_element(b"A", a);
    transcript.append_element(b"B", b);
    transcript.challenge(DLEQ_CHALLENGE_DOMAIN)
}

/// Prove `log_g(y) = log_h(z)` with witness `x`, so `y = x * g` and
/// `z = x * h`. The prover nonce is freshly random on every call.
pub fn prove<R: CryptoRngCore>(
    x: &Scalar,
    g: &RistrettoPoint,
    y: &RistrettoPoint,
    h: &RistrettoPoint,
    z: &RistrettoPoint,
    rng: &mut R,
) -> DleqProof {
    let k = group::random_scalar(rng);
    let a = g * k;
    let b = h * k;
    let c = challenge(g, h, y, z, &a, &b);
    let s = k + c * x;
    DleqProof { c, s }
}

/// Verify a proof that `log_g(y) = log_h(z)`.
///
/// All inputs are public; the only constant-time requirement is the final
/// challenge comparison.
pub fn verify(
    g: &RistrettoPoint,
    y: &RistrettoPoint,
    h: &RistrettoPoint,
    z: &RistrettoPoint,
    proof: &DleqProof,
) -> bool {
    let a = g * proof.s - y * proof.c;
    let b = h * proof.s - z * proof.c;
    let expected = challenge(g, h, y, z, &a, &b);
    bool::from(proof.c.ct_eq(&expected))
}
