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

//! SDHI attribute-indexed key derivation.
//!
//! From the primary pair `(sk_m, pk_m)` and an ordered attribute list, the
//! server derives `sk_a = sk_m * x^-1` where `x` hashes the length-prefixed
//! attributes. Since `x * pk_a = pk_m`, knowledge of `sk_a` is provable as
//! a DLEQ on `(G, pk_a, x*G, pk_m)`, which lets a client check that an
//! attribute key really descends from the published primary key.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::dleq::{self, DleqProof};
use crate::errors::{Error, Result};
use crate::group::{self, KDF_DOMAIN, SCALAR_SIZE};

/// Hash the attribute list to a scalar. Each attribute is prefixed with its
/// 64-bit big-endian length; an unprefixed concatenation would let two
/// different lists collide.
fn attribute_digest<A: AsRef<[u8]>>(attributes: &[A]) -> Result<Scalar> {
    if attributes.is_empty() {
        return Err(Error::NoAttributes);
    }
    let mut hasher = Sha512::new();
    hasher.update(KDF_DOMAIN);
    for attribute in attributes {
        let bytes = attribute.as_ref();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    Ok(Scalar::from_hash(hasher))
}

/// An attribute-derived key pair with the proof tying its public key to the
/// primary public key. Derived pairs are ephemeral: recomputed on demand,
/// never stored, zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyPair {
    pub secret_key: Scalar,
    pub public_key: RistrettoPoint,
    #[zeroize(skip)]
    pub proof: DleqProof,
}

/// The server's KDF state: the long-lived primary key pair. Immutable after
/// setup; the secret scalar is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Kdf {
    secret_key: Scalar,
    public_key: RistrettoPoint,
}

impl Kdf {
    /// Accept a canonical 32-byte scalar as the primary secret.
    pub fn from_raw_secret(bytes: &[u8; SCALAR_SIZE]) -> Result<Self> {
        let secret_key = group::decode_scalar(bytes)?;
        if secret_key == Scalar::ZERO {
            return Err(Error::ArithmeticDomain);
        }
        Ok(Self { public_key: group::basemult(&secret_key), secret_key })
    }

    /// Derive the primary secret from seed material of at least 32 bytes.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() < SCALAR_SIZE {
            return Err(Error::InvalidEncoding);
        }
        let secret_key = group::hash_to_scalar(KDF_DOMAIN, seed);
        if secret_key == Scalar::ZERO {
            return Err(Error::DerivationFailure);
        }
        Ok(Self { public_key: group::basemult(&secret_key), secret_key })
    }

    /// Generate a fresh primary key pair.
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        let secret_key = group::random_non_zero_scalar(rng);
        Self { public_key: group::basemult(&secret_key), secret_key }
    }

    /// The primary public key `pk_m = sk_m * G`.
    pub fn primary_public_key(&self) -> &RistrettoPoint {
        &self.public_key
    }

    /// Deterministically derive the key pair for an attribute list, without
    /// a proof. Used on the signing and redemption paths, where the caller
    /// already trusts the server state.
    pub fn derive_secret<A: AsRef<[u8]>>(
        &self,
        attributes: &[A],
    ) -> Result<(Zeroizing<Scalar>, RistrettoPoint)> {
        let x = attribute_digest(attributes)?;
        let (secret_key, public_key) = self.derive_with_digest(&x)?;
        Ok((Zeroizing::new(secret_key), public_key))
    }

    /// Derive the key pair for an attribute list together with a DLEQ proof
    /// on `(G, pk_a, x*G, pk_m)`. The pair is deterministic for a fixed
    /// primary key and attribute list; the proof nonce is fresh per call.
    pub fn derive_key_pair<A: AsRef<[u8]>, R: CryptoRngCore>(
        &self,
        attributes: &[A],
        rng: &mut R,
    ) -> Result<DerivedKeyPair> {
        let x = attribute_digest(attributes)?;
        let (secret_key, public_key) = self.derive_with_digest(&x)?;
        let shifted = group::basemult(&x);
        let proof = dleq::prove(
            &secret_key,
            &group::generator(),
            &public_key,
            &shifted,
            &self.public_key,
            rng,
        );
        Ok(DerivedKeyPair { secret_key, public_key, proof })
    }

    fn derive_with_digest(&self, x: &Scalar) -> Result<(Scalar, RistrettoPoint)> {
        // A zero digest has no inverse; there is no way to resample.
        if *x == Scalar::ZERO {
            return Err(Error::DerivationFailure);
        }
        let secret_key = self.secret_key * x.invert();
        Ok((secret_key, group::basemult(&secret_key)))
    }
}

/// Check that `pk_a` is the attribute key derived from `pk_m` for this
/// attribute list. Any failure, including an empty attribute list, is
/// `false`.
pub fn verify_public_key<A: AsRef<[u8]>>(
    primary_public_key: &RistrettoPoint,
    attribute_public_key: &RistrettoPoint,
    attributes: &[A],
    proof: &DleqProof,
) -> bool {
    let Ok(x) = attribute_digest(attributes) else {
        return false;
    };
    let shifted = group::basemult(&x);
    dleq::verify(
        &group::generator(),
        attribute_public_key,
        &shifted,
        primary_public_key,
        proof,
    )
}
