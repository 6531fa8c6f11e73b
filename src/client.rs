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

//! Client-side protocol driver.
//!
//! A [`Client`] is bound to the server's primary public key. Per
//! credential, the flow is strictly sequential: blind a token, send the
//! blinded element for signing, then verify and unblind the evaluation. A
//! failed proof is terminal for that credential; the pending state is
//! dropped (and its blinding factor zeroed) and a fresh token can restart
//! the flow.

use curve25519_dalek::ristretto::RistrettoPoint;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::dleq::{DleqProof, PROOF_SIZE};
use crate::errors::{Error, Result};
use crate::group::{self, ELEMENT_SIZE, TOKEN_SIZE};
use crate::kdf;
use crate::voprf::{self, Blinding, SharedSecret};

/// A credential awaiting the server's evaluation: the token and its secret
/// blinding state. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PendingCredential {
    token: [u8; TOKEN_SIZE],
    blinding: Blinding,
}

impl PendingCredential {
    pub fn token(&self) -> &[u8; TOKEN_SIZE] {
        &self.token
    }

    /// The blinded element to submit for signing.
    pub fn blinded_bytes(&self) -> [u8; ELEMENT_SIZE] {
        group::encode_element(&self.blinding.blinded)
    }

    /// Verify the evaluation proof against the attribute key, unblind, and
    /// finalize. Consumes the pending state either way; on failure the
    /// credential cannot be salvaged.
    pub fn finish(
        self,
        attribute_key: &RistrettoPoint,
        evaluated: &[u8; ELEMENT_SIZE],
        proof: &[u8; PROOF_SIZE],
    ) -> Result<Credential> {
        let evaluated = group::decode_element(evaluated)?;
        let proof = DleqProof::decode(proof)?;
        let unblinded = voprf::verifiable_unblind(&evaluated, &proof, &self.blinding, attribute_key)?;
        let shared_secret = voprf::client_finalize(&self.token, &unblinded);
        Ok(Credential { token: self.token, shared_secret })
    }
}

/// A redeemable credential: the only two values ever sent at redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: [u8; TOKEN_SIZE],
    pub shared_secret: SharedSecret,
}

/// Client handle bound to a server's primary public key.
pub struct Client {
    primary_public_key: RistrettoPoint,
}

impl Client {
    pub fn new(primary_public_key: &[u8; ELEMENT_SIZE]) -> Result<Self> {
        Ok(Self { primary_public_key: group::decode_element(primary_public_key)? })
    }

    /// Check an attribute key received from the server against the primary
    /// public key, returning the decoded key for use during issuance.
    pub fn verify_attribute_key<A: AsRef<[u8]>>(
        &self,
        public_key: &[u8; ELEMENT_SIZE],
        attributes: &[A],
        proof: &[u8; PROOF_SIZE],
    ) -> Result<RistrettoPoint> {
        let public_key = group::decode_element(public_key)?;
        let proof = DleqProof::decode(proof)?;
        if !kdf::verify_public_key(&self.primary_public_key, &public_key, attributes, &proof) {
            return Err(Error::ProofInvalid);
        }
        Ok(public_key)
    }

    /// Start issuance with a fresh random token.
    pub fn begin_issuance<R: CryptoRngCore>(&self, rng: &mut R) -> Result<PendingCredential> {
        let mut token = [0u8; TOKEN_SIZE];
        rng.fill_bytes(&mut token);
        self.begin_issuance_with_token(token, rng)
    }

    /// Start issuance with a caller-chosen token.
    pub fn begin_issuance_with_token<R: CryptoRngCore>(
        &self,
        token: [u8; TOKEN_SIZE],
        rng: &mut R,
    ) -> Result<PendingCredential> {
        let blinding = voprf::blind(&token, rng)?;
        Ok(PendingCredential { token, blinding })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::Kdf;
    use rand_core::OsRng;

    #[test]
    fn test_rejects_malformed_primary_key() {
        let mut bad = [0u8; ELEMENT_SIZE];
        bad[0] = 1;
        assert!(matches!(Client::new(&bad), Err(Error::InvalidEncoding)));
    }

    #[test]
    fn test_pending_credentials_are_independent() {
        let mut rng = OsRng;
        let kdf = Kdf::generate(&mut rng);
        let client = Client::new(&group::encode_element(kdf.primary_public_key())).unwrap();

        let first = client.begin_issuance(&mut rng).unwrap();
        let second = client.begin_issuance(&mut rng).unwrap();
        assert_ne!(first.token(), second.token());
        assert_ne!(first.blinded_bytes(), second.blinded_bytes());
    }

    #[test]
    fn test_finish_rejects_malformed_proof_bytes() {
        let mut rng = OsRng;
        let kdf = Kdf::generate(&mut rng);
        let client = Client::new(&group::encode_element(kdf.primary_public_key())).unwrap();
        let attributes = vec![b"app:demo".to_vec()];

        let derived = kdf.derive_key_pair(&attributes, &mut rng).unwrap();
        let pending = client.begin_issuance(&mut rng).unwrap();
        let blinded = group::decode_element(&pending.blinded_bytes()).unwrap();
        let (evaluated, _) = voprf::evaluate_with_proof(&derived.secret_key, &blinded, &mut rng);

        assert_eq!(
            pending.finish(
                &derived.public_key,
                &group::encode_element(&evaluated),
                &[0xff; PROOF_SIZE]
            ),
            Err(Error::InvalidEncoding)
        );
    }
}
