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

use thiserror::Error;

/// An error raised by the credential core or the service adapter.
///
/// Display strings never carry key material or request bytes; handlers may
/// log them verbatim.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A 32-byte scalar or element encoding failed canonical decoding.
    #[error("invalid scalar or element encoding")]
    InvalidEncoding,

    /// A DLEQ proof failed verification.
    #[error("proof verification failed")]
    ProofInvalid,

    /// A scalar inverse was requested for zero.
    #[error("scalar arithmetic outside its domain")]
    ArithmeticDomain,

    /// A key derivation was requested for an empty attribute list.
    #[error("attribute list is empty")]
    NoAttributes,

    /// A hash-derived value fell outside the usable range (zero scalar
    /// digest, identity hash point). Cryptographically negligible.
    #[error("key derivation failed")]
    DerivationFailure,

    /// The shared secret presented at redemption does not match the
    /// server's own evaluation.
    #[error("shared secret mismatch")]
    SecretMismatch,

    /// The request requires an authenticated caller and none was
    /// established.
    #[error("caller authentication required")]
    AuthRequired,
}

impl Error {
    /// Stable label for counters and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidEncoding => "invalid_encoding",
            Error::ProofInvalid => "proof_invalid",
            Error::ArithmeticDomain => "arithmetic_domain",
            Error::NoAttributes => "no_attributes",
            Error::DerivationFailure => "derivation_failure",
            Error::SecretMismatch => "secret_mismatch",
            Error::AuthRequired => "auth_required",
        }
    }
}

/// Result type for the crate.
pub type Result<T> = core::result::Result<T, Error>;
