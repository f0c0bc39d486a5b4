// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    common::{ChainId, ClientError},
    provider::WalletProvider,
};

/// The EIP-3085 error code for a chain the wallet does not know about.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything the wallet needs to register a chain, in the parameter shape of
/// `wallet_addEthereumChain`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    /// The Sepolia test network, the chain the crowdfunding contract is
    /// deployed on.
    pub fn sepolia() -> Self {
        Self {
            chain_id: ChainId(0xaa36a7),
            chain_name: "Sepolia Test Network".to_string(),
            rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
            native_currency: NativeCurrency {
                name: "Sepolia ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
        }
    }
}

/// Makes sure the wallet is on the required chain.
///
/// Reads the active chain; on mismatch requests a switch, registering the
/// chain first if the wallet reports it as unknown. If the user declines
/// either prompt this fails with `NetworkMismatch` and the caller must degrade
/// to a disabled state rather than proceed on the wrong chain.
pub async fn ensure_chain<P: WalletProvider>(
    provider: &P,
    descriptor: &ChainDescriptor,
) -> Result<(), ClientError> {
    let actual = provider.chain_id().await?;
    if actual == descriptor.chain_id {
        return Ok(());
    }
    info!(%actual, expected = %descriptor.chain_id, "active chain mismatch, requesting switch");
    let mismatch = || ClientError::NetworkMismatch {
        expected: descriptor.chain_id,
        actual,
    };
    match switch_chain(provider, descriptor).await {
        Ok(()) => Ok(()),
        Err(ClientError::Rpc(error)) if error.code == UNRECOGNIZED_CHAIN_CODE => {
            info!(chain = %descriptor.chain_id, "chain unknown to the wallet, registering it");
            match add_chain(provider, descriptor).await {
                Ok(()) => {}
                Err(ClientError::UserRejected) => return Err(mismatch()),
                Err(error) => return Err(error),
            }
            match switch_chain(provider, descriptor).await {
                Ok(()) => Ok(()),
                Err(ClientError::UserRejected) => Err(mismatch()),
                Err(error) => Err(error),
            }
        }
        Err(ClientError::UserRejected) => Err(mismatch()),
        Err(error) => Err(error),
    }
}

async fn switch_chain<P: WalletProvider>(
    provider: &P,
    descriptor: &ChainDescriptor,
) -> Result<(), ClientError> {
    let _: serde_json::Value = provider
        .request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": descriptor.chain_id.as_hex() }]),
        )
        .await?;
    Ok(())
}

async fn add_chain<P: WalletProvider>(
    provider: &P,
    descriptor: &ChainDescriptor,
) -> Result<(), ClientError> {
    let _: serde_json::Value = provider
        .request("wallet_addEthereumChain", json!([descriptor]))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ChainDescriptor;

    #[test]
    fn descriptor_serializes_in_wallet_parameter_shape() {
        let value = serde_json::to_value(ChainDescriptor::sepolia()).unwrap();
        assert_eq!(value["chainId"], "0xaa36a7");
        assert_eq!(value["chainName"], "Sepolia Test Network");
        assert_eq!(value["nativeCurrency"]["decimals"], 18);
        assert_eq!(value["rpcUrls"][0], "https://rpc.sepolia.org");
        assert_eq!(value["blockExplorerUrls"][0], "https://sepolia.etherscan.io");
    }
}
