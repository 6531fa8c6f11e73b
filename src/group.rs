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

//! Prime-order group operations over Ristretto255.
//!
//! Scalar and element arithmetic are the `curve25519-dalek` operator
//! implementations; this module adds the randomized, hashed, and serialized
//! entry points the protocol needs, plus the fixed domain-separation tags.
//! Every tag is part of the wire format: changing one invalidates all
//! outstanding credentials.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha512};

use crate::errors::{Error, Result};

/// Canonical scalar encoding width.
pub const SCALAR_SIZE: usize = 32;
/// Canonical element encoding width.
pub const ELEMENT_SIZE: usize = 32;
/// Width of a credential token.
pub const TOKEN_SIZE: usize = 32;
/// Width of the finalized shared secret.
pub const SHARED_SECRET_SIZE: usize = 64;

pub(crate) const HASH_TO_GROUP_DOMAIN: &[u8] = b"anoncred/v1 hash-to-group";
pub(crate) const DLEQ_CHALLENGE_DOMAIN: &str = "anoncred/v1 dleq-challenge";
pub(crate) const KDF_DOMAIN: &[u8] = b"anoncred/v1 kdf-sdhi";
pub(crate) const FINALIZE_DOMAIN: &[u8] = b"anoncred/v1 finalize";

/// The fixed group generator G.
pub fn generator() -> RistrettoPoint {
    RISTRETTO_BASEPOINT_POINT
}

/// Compute `s * G` using the basepoint table.
pub fn basemult(s: &Scalar) -> RistrettoPoint {
    RistrettoPoint::mul_base(s)
}

/// Generate a uniform random scalar.
pub fn random_scalar<R: CryptoRngCore>(rng: &mut R) -> Scalar {
    Scalar::random(rng)
}

/// Generate a uniform random non-zero scalar.
pub fn random_non_zero_scalar<R: CryptoRngCore>(rng: &mut R) -> Scalar {
    loop {
        let s = Scalar::random(rng);
        if s != Scalar::ZERO {
            return s;
        }
    }
}

/// Multiplicative inverse mod the group order. Zero has no inverse.
pub fn scalar_invert(s: &Scalar) -> Result<Scalar> {
    if *s == Scalar::ZERO {
        return Err(Error::ArithmeticDomain);
    }
    Ok(s.invert())
}

/// Hash an arbitrary message to a uniformly distributed group element.
pub fn hash_to_group(msg: &[u8]) -> RistrettoPoint {
    let mut hasher = Sha512::new();
    hasher.update(HASH_TO_GROUP_DOMAIN);
    hasher.update(msg);
    let uniform: [u8; 64] = hasher.finalize().into();
    RistrettoPoint::from_uniform_bytes(&uniform)
}

/// Hash a domain tag plus message to a uniform scalar.
pub fn hash_to_scalar(domain: &[u8], msg: &[u8]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(domain);
    hasher.update(msg);
    Scalar::from_hash(hasher)
}

/// Canonical 32-byte scalar encoding.
pub fn encode_scalar(s: &Scalar) -> [u8; SCALAR_SIZE] {
    s.to_bytes()
}

/// Decode a scalar, rejecting non-canonical bytes.
pub fn decode_scalar(bytes: &[u8; SCALAR_SIZE]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*bytes)).ok_or(Error::InvalidEncoding)
}

/// Canonical 32-byte element encoding.
pub fn encode_element(p: &RistrettoPoint) -> [u8; ELEMENT_SIZE] {
    p.compress().to_bytes()
}

/// Decode an element, rejecting non-canonical bytes.
pub fn decode_element(bytes: &[u8; ELEMENT_SIZE]) -> Result<RistrettoPoint> {
    CompressedRistretto(*bytes)
        .decompress()
        .ok_or(Error::InvalidEncoding)
}

/// The domain-separated 64-byte finalize hash `H_2(token || element)`.
pub(crate) fn finalize_hash(token: &[u8; TOKEN_SIZE], element: &RistrettoPoint) -> [u8; SHARED_SECRET_SIZE] {
    let mut hasher = Sha512::new();
    hasher.update(FINALIZE_DOMAIN);
    hasher.update(token);
    hasher.update(element.compress().as_bytes());
    hasher.finalize().into()
}
