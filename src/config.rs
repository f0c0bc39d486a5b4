// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{common::ClientError, contract::MethodNames, network::ChainDescriptor};

/// Which of the contract's diverged method-name tables to use. The deployed
/// prototypes never settled on one, so this is configuration, not code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    #[default]
    Campaigns,
    Events,
}

impl NamingScheme {
    pub fn method_names(&self) -> MethodNames {
        match self {
            NamingScheme::Campaigns => MethodNames::campaigns(),
            NamingScheme::Events => MethodNames::events(),
        }
    }
}

/// The client configuration. The contract address comes from the deployment
/// tool's output; there is no programmatic address discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub contract_address: Address,
    #[serde(default = "ChainDescriptor::sepolia")]
    pub chain: ChainDescriptor,
    #[serde(default)]
    pub naming: NamingScheme,
}

impl ClientConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            chain: ChainDescriptor::sepolia(),
            naming: NamingScheme::default(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;

    use super::{ClientConfig, NamingScheme};
    use crate::common::ChainId;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "contract_address": "0x2b2c3ce584b510fd6213e2082e7e84a61e796f32" }"#,
        )
        .unwrap();
        assert_eq!(config.chain.chain_id, ChainId(0xaa36a7));
        assert_eq!(config.naming, NamingScheme::Campaigns);
    }

    #[test]
    fn naming_scheme_selects_method_table() {
        let mut config = ClientConfig::new(Address::ZERO);
        assert_eq!(config.naming.method_names().count, "campaignCount()");
        config.naming = NamingScheme::Events;
        assert_eq!(config.naming.method_names().count, "eventCount()");

        let parsed: NamingScheme = serde_json::from_str("\"events\"").unwrap();
        assert_eq!(parsed, NamingScheme::Events);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ClientConfig::new(Address::repeat_byte(0x2b));
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
