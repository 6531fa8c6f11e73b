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

//! Verifiable oblivious PRF, multiplicative Two-Hash-DH.
//!
//! The PRF is `PRF_sk(t) = H_2(t, sk * H_1(t))` where `H_1` is
//! [`group::hash_to_group`] and `H_2` is the domain-separated 64-byte
//! finalize hash. The client multiplies `H_1(t)` by a secret blinding
//! factor before sending it, so the server never sees the token; the
//! server's evaluation carries a DLEQ proof the client checks before
//! unblinding.

use core::fmt;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use rand_core::CryptoRngCore;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::dleq::{self, DleqProof};
use crate::errors::{Error, Result};
use crate::group::{self, SHARED_SECRET_SIZE, TOKEN_SIZE};

/// The client's secret blinding state for one credential: the blinding
/// factor and the blinded element sent to the server. The factor is zeroed
/// on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Blinding {
    pub factor: Scalar,
    pub blinded: RistrettoPoint,
}

/// The 64-byte PRF output binding a token to a server key; the redemption
/// witness.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(REDACTED)")
    }
}

impl ConstantTimeEq for SharedSecret {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for SharedSecret {}

/// Generate an evaluation key pair `(sk, pk)` with `pk = sk * G`.
pub fn setup<R: CryptoRngCore>(rng: &mut R) -> (Scalar, RistrettoPoint) {
    let sk = group::random_non_zero_scalar(rng);
    let pk = group::basemult(&sk);
    (sk, pk)
}

/// Blind a token for evaluation: `blinded = r * H_1(token)` with a fresh
/// non-zero `r`.
pub fn blind<R: CryptoRngCore>(token: &[u8; TOKEN_SIZE], rng: &mut R) -> Result<Blinding> {
    let hashed = group::hash_to_group(token);
    if hashed.is_identity() {
        return Err(Error::DerivationFailure);
    }
    let factor = group::random_non_zero_scalar(rng);
    Ok(Blinding { blinded: hashed * factor, factor })
}

/// Evaluate the PRF on a blinded element: `sk * blinded`.
pub fn evaluate(sk: &Scalar, blinded: &RistrettoPoint) -> RistrettoPoint {
    blinded * sk
}

/// Evaluate and prove the evaluation: a DLEQ proof that
/// `log_G(pk) = log_blinded(evaluated)`, with `pk = sk * G`.
pub fn evaluate_with_proof<R: CryptoRngCore>(
    sk: &Scalar,
    blinded: &RistrettoPoint,
    rng: &mut R,
) -> (RistrettoPoint, DleqProof) {
    let evaluated = evaluate(sk, blinded);
    let public_key = group::basemult(sk);
    let proof = dleq::prove(sk, &group::generator(), &public_key, blinded, &evaluated, rng);
    (evaluated, proof)
}

/// Check the evaluation proof against `(G, pk, blinded, evaluated)`, then
/// strip the blinding: `unblinded = r^-1 * evaluated = sk * H_1(token)`.
///
/// A failed proof is fatal for this credential; the caller discards the
/// blinding state and may restart from [`blind`].
pub fn verifiable_unblind(
    evaluated: &RistrettoPoint,
    proof: &DleqProof,
    blinding: &Blinding,
    public_key: &RistrettoPoint,
) -> Result<RistrettoPoint> {
    // An identity evaluation would let a zero key or degenerate blinded
    // element pass the arithmetic below.
    if evaluated.is_identity() {
        return Err(Error::ProofInvalid);
    }
    if !dleq::verify(&group::generator(), public_key, &blinding.blinded, evaluated, proof) {
        return Err(Error::ProofInvalid);
    }
    let factor_inv = group::scalar_invert(&blinding.factor)?;
    Ok(evaluated * factor_inv)
}

/// Finalize on the client from the unblinded evaluation.
pub fn client_finalize(token: &[u8; TOKEN_SIZE], unblinded: &RistrettoPoint) -> SharedSecret {
    SharedSecret(group::finalize_hash(token, unblinded))
}

/// Finalize on the server directly from the token: equals the client
/// output for the same `sk` and token.
pub fn server_finalize(sk: &Scalar, token: &[u8; TOKEN_SIZE]) -> SharedSecret {
    let evaluated = group::hash_to_group(token) * sk;
    SharedSecret(group::finalize_hash(token, &evaluated))
}
