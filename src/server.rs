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

//! Server-side service adapter: the four credential operations.
//!
//! [`CredentialService`] owns the primary key pair for the process lifetime
//! and exposes transport-agnostic handlers. All inbound bytes are decoded
//! before any arithmetic; failures are counted and logged by kind, never by
//! content.
//!
//! Redemption asserts cryptographic validity only. Double-spend detection
//! is the caller's responsibility; a deduplication ledger belongs in the
//! layer that owns request persistence.

use core::fmt;

use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;

use crate::config::ServiceConfig;
use crate::dleq::PROOF_SIZE;
use crate::errors::{Error, Result};
use crate::group::{self, ELEMENT_SIZE, SHARED_SECRET_SIZE, TOKEN_SIZE};
use crate::kdf::Kdf;
use crate::metrics;
use crate::voprf;

/// An authenticated caller, as established by the transport's
/// [`Authenticator`] before a signing request reaches the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-side client authentication. The core does not prescribe the
/// mechanism; it only requires that signing happens on behalf of an
/// established [`CallerIdentity`]. See
/// [`CredentialService::sign_credential_with_evidence`].
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, evidence: &[u8]) -> Result<CallerIdentity>;
}

/// Response to `getPublicKeyAndProof`.
#[derive(Debug, Clone)]
pub struct AttributeKeyResponse {
    pub public_key: [u8; ELEMENT_SIZE],
    pub proof: [u8; PROOF_SIZE],
}

/// Response to `signCredential`.
#[derive(Debug, Clone)]
pub struct SignCredentialResponse {
    pub evaluated: [u8; ELEMENT_SIZE],
    pub proof: [u8; PROOF_SIZE],
}

/// The credential service: the primary key pair for the process lifetime.
/// Handlers are synchronous and stateless per call; the embedding transport
/// may invoke them concurrently.
pub struct CredentialService {
    kdf: Kdf,
}

impl CredentialService {
    pub fn new(kdf: Kdf) -> Self {
        Self { kdf }
    }

    /// Build the service from process configuration, sourcing the master
    /// secret as configured.
    pub fn from_config<R: CryptoRngCore>(config: &ServiceConfig, rng: &mut R) -> anyhow::Result<Self> {
        let kdf = match config.load_master_secret()? {
            None => {
                tracing::info!("generating fresh primary key pair");
                Kdf::generate(rng)
            }
            Some(material) if config.master_is_raw => {
                let raw: &[u8; 32] = material
                    .as_slice()
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("raw master secret must be exactly 32 bytes"))?;
                Kdf::from_raw_secret(raw)?
            }
            Some(material) => Kdf::from_seed(&material)?,
        };
        Ok(Self::new(kdf))
    }

    /// `getPrimaryPublicKey`: always succeeds.
    pub fn primary_public_key(&self) -> [u8; ELEMENT_SIZE] {
        group::encode_element(self.kdf.primary_public_key())
    }

    /// `getPublicKeyAndProof`: the attribute key for this attribute list,
    /// with the proof linking it to the primary public key.
    pub fn public_key_and_proof<A: AsRef<[u8]>, R: CryptoRngCore>(
        &self,
        attributes: &[A],
        rng: &mut R,
    ) -> Result<AttributeKeyResponse> {
        self.observe("getPublicKeyAndProof", || {
            let derived = self.kdf.derive_key_pair(attributes, rng)?;
            Ok(AttributeKeyResponse {
                public_key: group::encode_element(&derived.public_key),
                proof: derived.proof.to_bytes(),
            })
        })
    }

    /// `signCredential` behind the authentication seam: establish the
    /// caller from transport evidence, then sign. Any authentication
    /// failure surfaces as [`Error::AuthRequired`] before the blinded
    /// element is even decoded.
    pub fn sign_credential_with_evidence<A: AsRef<[u8]>, R: CryptoRngCore>(
        &self,
        evidence: &[u8],
        authenticator: &dyn Authenticator,
        blinded: &[u8; ELEMENT_SIZE],
        attributes: &[A],
        rng: &mut R,
    ) -> Result<SignCredentialResponse> {
        let caller = self.observe("signCredential", || {
            authenticator.authenticate(evidence).map_err(|_| Error::AuthRequired)
        })?;
        self.sign_credential(&caller, blinded, attributes, rng)
    }

    /// `signCredential`: evaluate the VOPRF on a blinded element under the
    /// attribute-derived key, with an evaluation proof.
    ///
    /// Takes an already-established caller identity; transports that have
    /// not authenticated yet go through
    /// [`sign_credential_with_evidence`](Self::sign_credential_with_evidence).
    pub fn sign_credential<A: AsRef<[u8]>, R: CryptoRngCore>(
        &self,
        caller: &CallerIdentity,
        blinded: &[u8; ELEMENT_SIZE],
        attributes: &[A],
        rng: &mut R,
    ) -> Result<SignCredentialResponse> {
        self.observe("signCredential", || {
            let blinded = group::decode_element(blinded)?;
            let (secret_key, _) = self.kdf.derive_secret(attributes)?;
            let (evaluated, proof) = voprf::evaluate_with_proof(&secret_key, &blinded, rng);
            tracing::debug!(caller = %caller, "signed credential");
            Ok(SignCredentialResponse {
                evaluated: group::encode_element(&evaluated),
                proof: proof.to_bytes(),
            })
        })
    }

    /// `redeemCredential`: recompute the shared secret for this token and
    /// attribute list and compare in constant time.
    pub fn redeem_credential<A: AsRef<[u8]>>(
        &self,
        token: &[u8; TOKEN_SIZE],
        shared_secret: &[u8; SHARED_SECRET_SIZE],
        attributes: &[A],
    ) -> Result<()> {
        self.observe("redeemCredential", || {
            let (secret_key, _) = self.kdf.derive_secret(attributes)?;
            let expected = voprf::server_finalize(&secret_key, token);
            if bool::from(expected.as_bytes()[..].ct_eq(&shared_secret[..])) {
                Ok(())
            } else {
                Err(Error::SecretMismatch)
            }
        })
    }

    fn observe<T>(&self, operation: &'static str, handler: impl FnOnce() -> Result<T>) -> Result<T> {
        let result = handler();
        if let Err(error) = &result {
            metrics::CREDENTIAL_REQUEST_FAILURES
                .with_label_values(&[operation, error.kind()])
                .inc();
            tracing::warn!(operation, error = %error, "request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::group::KDF_DOMAIN;
    use rand_core::OsRng;

    fn test_service() -> CredentialService {
        // Fixed primary key so failures reproduce.
        let sk = group::hash_to_scalar(KDF_DOMAIN, b"test-master");
        CredentialService::new(Kdf::from_raw_secret(&group::encode_scalar(&sk)).unwrap())
    }

    fn test_attributes() -> Vec<Vec<u8>> {
        vec![b"app:demo".to_vec(), b"2024-01".to_vec()]
    }

    fn test_token() -> [u8; TOKEN_SIZE] {
        let mut token = [0u8; TOKEN_SIZE];
        token[TOKEN_SIZE - 1] = 1;
        token
    }

    // The failure counters are process-global; tests assert deltas on the
    // kinds only they trigger through the service.
    fn failure_count(operation: &str, kind: &str) -> u64 {
        metrics::CREDENTIAL_REQUEST_FAILURES.with_label_values(&[operation, kind]).get()
    }

    /// Accepts evidence of the form `caller:<name>`.
    struct PrefixAuthenticator;

    impl Authenticator for PrefixAuthenticator {
        fn authenticate(&self, evidence: &[u8]) -> Result<CallerIdentity> {
            match std::str::from_utf8(evidence).ok().and_then(|e| e.strip_prefix("caller:")) {
                Some(name) if !name.is_empty() => Ok(CallerIdentity::new(name)),
                _ => Err(Error::AuthRequired),
            }
        }
    }

    #[test]
    fn test_issue_and_redeem_round_trip() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();
        let issued = service.public_key_and_proof(&attributes, &mut rng).unwrap();
        let attribute_key = client
            .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
            .unwrap();

        let pending = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
        let signed = service
            .sign_credential_with_evidence(
                b"caller:issuer-gateway",
                &PrefixAuthenticator,
                &pending.blinded_bytes(),
                &attributes,
                &mut rng,
            )
            .unwrap();
        let credential = pending.finish(&attribute_key, &signed.evaluated, &signed.proof).unwrap();

        assert_eq!(credential.token, test_token());
        service
            .redeem_credential(&credential.token, credential.shared_secret.as_bytes(), &attributes)
            .unwrap();
    }

    #[test]
    fn test_sign_without_valid_evidence_is_rejected() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();
        let pending = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();

        let before = failure_count("signCredential", "auth_required");
        for evidence in [&b"anonymous"[..], &b"caller:"[..], &b""[..]] {
            assert_eq!(
                service
                    .sign_credential_with_evidence(
                        evidence,
                        &PrefixAuthenticator,
                        &pending.blinded_bytes(),
                        &attributes,
                        &mut rng,
                    )
                    .map(|_| ()),
                Err(Error::AuthRequired)
            );
        }
        assert_eq!(failure_count("signCredential", "auth_required") - before, 3);
    }

    #[test]
    fn test_tampered_evaluation_fails_unblind() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();
        let issued = service.public_key_and_proof(&attributes, &mut rng).unwrap();
        let attribute_key = client
            .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
            .unwrap();

        let pending = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
        let caller = CallerIdentity::new("issuer-gateway");
        let signed = service
            .sign_credential(&caller, &pending.blinded_bytes(), &attributes, &mut rng)
            .unwrap();

        // Substitute a different valid element for the evaluation.
        let tampered_point = group::decode_element(&signed.evaluated).unwrap() + group::generator();
        let tampered = group::encode_element(&tampered_point);
        assert_eq!(
            pending.finish(&attribute_key, &tampered, &signed.proof),
            Err(Error::ProofInvalid)
        );
    }

    #[test]
    fn test_bit_flipped_evaluation_never_redeems() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();
        let issued = service.public_key_and_proof(&attributes, &mut rng).unwrap();
        let attribute_key = client
            .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
            .unwrap();
        let caller = CallerIdentity::new("issuer-gateway");

        // Whether the flip lands on an invalid encoding or a wrong element,
        // finalization must fail.
        for bit in 0..8 {
            let pending = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
            let signed = service
                .sign_credential(&caller, &pending.blinded_bytes(), &attributes, &mut rng)
                .unwrap();
            let mut tampered = signed.evaluated;
            tampered[0] ^= 1 << bit;
            assert!(pending.finish(&attribute_key, &tampered, &signed.proof).is_err());
        }
    }

    #[test]
    fn test_wrong_attributes_at_redeem() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();
        let issued = service.public_key_and_proof(&attributes, &mut rng).unwrap();
        let attribute_key = client
            .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
            .unwrap();

        let pending = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
        let caller = CallerIdentity::new("issuer-gateway");
        let signed = service
            .sign_credential(&caller, &pending.blinded_bytes(), &attributes, &mut rng)
            .unwrap();
        let credential = pending.finish(&attribute_key, &signed.evaluated, &signed.proof).unwrap();

        let other = vec![b"app:demo".to_vec(), b"2024-02".to_vec()];
        let before = failure_count("redeemCredential", "secret_mismatch");
        assert_eq!(
            service.redeem_credential(&credential.token, credential.shared_secret.as_bytes(), &other),
            Err(Error::SecretMismatch)
        );
        assert_eq!(failure_count("redeemCredential", "secret_mismatch") - before, 1);
    }

    #[test]
    fn test_key_substitution_is_caught_by_client() {
        let mut rng = OsRng;
        let service = test_service();
        let rogue = CredentialService::new(Kdf::generate(&mut rng));
        let attributes = test_attributes();

        let client = Client::new(&service.primary_public_key()).unwrap();

        // A key and proof from a different primary key never verifies.
        let forged = rogue.public_key_and_proof(&attributes, &mut rng).unwrap();
        assert_eq!(
            client.verify_attribute_key(&forged.public_key, &attributes, &forged.proof),
            Err(Error::ProofInvalid)
        );
    }

    #[test]
    fn test_rejects_malformed_wire_bytes() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();
        let caller = CallerIdentity::new("issuer-gateway");

        let before_encoding = failure_count("signCredential", "invalid_encoding");
        let mut bad_element = [0u8; ELEMENT_SIZE];
        bad_element[0] = 1;
        assert_eq!(
            service.sign_credential(&caller, &bad_element, &attributes, &mut rng).map(|_| ()),
            Err(Error::InvalidEncoding)
        );
        assert_eq!(failure_count("signCredential", "invalid_encoding") - before_encoding, 1);

        let before_attributes = failure_count("getPublicKeyAndProof", "no_attributes");
        let empty: Vec<Vec<u8>> = vec![];
        assert_eq!(
            service.public_key_and_proof(&empty, &mut rng).map(|_| ()),
            Err(Error::NoAttributes)
        );
        assert_eq!(failure_count("getPublicKeyAndProof", "no_attributes") - before_attributes, 1);
    }

    #[test]
    fn test_distinct_sessions_are_unlinkable() {
        let mut rng = OsRng;
        let service = test_service();
        let attributes = test_attributes();
        let caller = CallerIdentity::new("issuer-gateway");
        let client = Client::new(&service.primary_public_key()).unwrap();

        // Two clients blind the same token value; the server-visible pairs
        // must differ, and neither equals the raw token hash.
        let first = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
        let second = client.begin_issuance_with_token(test_token(), &mut rng).unwrap();
        assert_ne!(first.blinded_bytes(), second.blinded_bytes());

        let hashed = group::encode_element(&group::hash_to_group(&test_token()));
        assert_ne!(first.blinded_bytes(), hashed);
        assert_ne!(second.blinded_bytes(), hashed);

        let signed_first = service
            .sign_credential(&caller, &first.blinded_bytes(), &attributes, &mut rng)
            .unwrap();
        let signed_second = service
            .sign_credential(&caller, &second.blinded_bytes(), &attributes, &mut rng)
            .unwrap();
        assert_ne!(signed_first.evaluated, signed_second.evaluated);
    }

    #[test]
    fn test_deterministic_redemption_across_instances() {
        let mut rng = OsRng;
        let attributes = test_attributes();

        // Two service instances from the same master secret accept each
        // other's credentials.
        let issuer = test_service();
        let redeemer = test_service();

        let client = Client::new(&issuer.primary_public_key()).unwrap();
        let issued = issuer.public_key_and_proof(&attributes, &mut rng).unwrap();
        let attribute_key = client
            .verify_attribute_key(&issued.public_key, &attributes, &issued.proof)
            .unwrap();

        let pending = client.begin_issuance(&mut rng).unwrap();
        let caller = CallerIdentity::new("issuer-gateway");
        let signed = issuer
            .sign_credential(&caller, &pending.blinded_bytes(), &attributes, &mut rng)
            .unwrap();
        let credential = pending.finish(&attribute_key, &signed.evaluated, &signed.proof).unwrap();

        redeemer
            .redeem_credential(&credential.token, credential.shared_secret.as_bytes(), &attributes)
            .unwrap();
    }

    #[test]
    fn test_from_config_generated() {
        use crate::config::{Curve, KdfSuite, MasterSecretSource, ServiceConfig, VoprfBlinding};

        let mut rng = OsRng;
        let config = ServiceConfig {
            listen_address: "127.0.0.1:0".into(),
            curve: Curve::default(),
            voprf_blinding: VoprfBlinding::default(),
            kdf: KdfSuite::default(),
            master_secret_source: MasterSecretSource::Generated,
            master_is_raw: false,
        };
        let service = CredentialService::from_config(&config, &mut rng).unwrap();
        // A generated key is usable immediately.
        let attributes = test_attributes();
        service.public_key_and_proof(&attributes, &mut rng).unwrap();
    }

    #[test]
    fn test_from_config_raw_env_secret() {
        use crate::config::{Curve, KdfSuite, MasterSecretSource, ServiceConfig, VoprfBlinding};

        let mut rng = OsRng;
        let sk = group::hash_to_scalar(KDF_DOMAIN, b"config-master");
        std::env::set_var("ANONCRED_TEST_RAW_MASTER", hex::encode(group::encode_scalar(&sk)));

        let config = ServiceConfig {
            listen_address: "127.0.0.1:0".into(),
            curve: Curve::default(),
            voprf_blinding: VoprfBlinding::default(),
            kdf: KdfSuite::default(),
            master_secret_source: MasterSecretSource::Env { var: "ANONCRED_TEST_RAW_MASTER".into() },
            master_is_raw: true,
        };
        let service = CredentialService::from_config(&config, &mut rng).unwrap();
        assert_eq!(service.primary_public_key(), group::encode_element(&group::basemult(&sk)));
    }
}
