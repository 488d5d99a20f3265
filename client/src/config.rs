// Identity Registry
// Copyright (C) 2019 Monadic GmbH <radicle@monadic.xyz>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Client configuration.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::env;

use crate::interface::Account;

/// Chain ID of the Sepolia test network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Environment variable overriding [ClientConfig::contract_address].
pub const CONTRACT_ADDRESS_VAR: &str = "IDENTITY_REGISTRY_CONTRACT";

/// Environment variable overriding [ClientConfig::chain_id].
pub const CHAIN_ID_VAR: &str = "IDENTITY_REGISTRY_CHAIN_ID";

lazy_static! {
    /// Address of the identity verification contract deployed on Sepolia.
    pub static ref SEPOLIA_CONTRACT_ADDRESS: Account = "0x886a5152EecAdfB7E5De6a7Cc2e0617aBc298e1E"
        .parse()
        .expect("valid address literal");
}

/// Location of the identity verification contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub contract_address: Account,
    /// The chain the wallet has to be connected to.
    pub chain_id: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            contract_address: *SEPOLIA_CONTRACT_ADDRESS,
            chain_id: SEPOLIA_CHAIN_ID,
        }
    }
}

impl ClientConfig {
    /// Build the configuration from the environment, falling back to [ClientConfig::default]
    /// for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();
        if let Ok(value) = env::var(CONTRACT_ADDRESS_VAR) {
            config.contract_address = value.parse().map_err(|err: crate::InvalidAccountError| {
                ConfigError {
                    var: CONTRACT_ADDRESS_VAR,
                    reason: err.to_string(),
                }
            })?;
        }
        if let Ok(value) = env::var(CHAIN_ID_VAR) {
            config.chain_id = value.trim().parse().map_err(|err: std::num::ParseIntError| {
                ConfigError {
                    var: CHAIN_ID_VAR,
                    reason: err.to_string(),
                }
            })?;
        }
        Ok(config)
    }
}

/// An environment variable holds a value that cannot be used.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}
