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

//! Process configuration for the credential service.
//!
//! The primitive selectors are closed enums with a single recognized member
//! each; a config naming anything else fails to parse. Deployments that add
//! a second member must treat it as a new, incompatible credential universe.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// The prime-order group backing all protocol arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    #[default]
    Ristretto255,
}

/// The VOPRF blinding mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoprfBlinding {
    #[default]
    Multiplicative,
}

/// The attribute key-derivation function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdfSuite {
    #[default]
    Sdhi,
}

/// Where the primary master secret comes from at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum MasterSecretSource {
    /// Hex-encoded secret material in a file.
    File { path: PathBuf },
    /// Hex-encoded secret material in an environment variable.
    Env { var: String },
    /// Generate a fresh primary key at startup. Credentials do not survive
    /// a restart in this mode.
    Generated,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Transport binding, consumed by the external RPC layer.
    pub listen_address: String,
    #[serde(default)]
    pub curve: Curve,
    #[serde(default)]
    pub voprf_blinding: VoprfBlinding,
    #[serde(default)]
    pub kdf: KdfSuite,
    pub master_secret_source: MasterSecretSource,
    /// When true, the master secret is taken as a canonical 32-byte scalar;
    /// otherwise it is seed material of at least 32 bytes.
    #[serde(default)]
    pub master_is_raw: bool,
}

impl ServiceConfig {
    /// Read the configured master secret material. `None` means a fresh key
    /// should be generated.
    pub fn load_master_secret(&self) -> anyhow::Result<Option<Zeroizing<Vec<u8>>>> {
        let hex_material = match &self.master_secret_source {
            MasterSecretSource::File { path } => Zeroizing::new(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading master secret file {}", path.display()))?,
            ),
            MasterSecretSource::Env { var } => Zeroizing::new(
                std::env::var(var)
                    .with_context(|| format!("reading master secret from ${var}"))?,
            ),
            MasterSecretSource::Generated => return Ok(None),
        };
        let bytes = hex::decode(hex_material.trim())
            .context("master secret material is not valid hex")?;
        Ok(Some(Zeroizing::new(bytes)))
    }
}

/// Load a [`ServiceConfig`] from a JSON file.
pub fn load_config(path: &Path) -> anyhow::Result<ServiceConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_json::from_str(&contents).context("parsing config file")
}
