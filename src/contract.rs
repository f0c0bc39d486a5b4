// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use alloy_primitives::{hex, keccak256, Address, B256, U256};
use alloy_sol_types::{abi::TokenSeq, SolType, SolValue};
use serde::Deserialize;
use serde_json::json;

use crate::{common::ClientError, provider::WalletProvider};

const ERC20_BALANCE_OF: &str = "balanceOf(address)";
const ERC20_DECIMALS: &str = "decimals()";

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The contract's method signatures.
///
/// The deployed prototypes diverged between `campaigns` and `events` naming,
/// so the mapping is a configuration point rather than a set of hard-coded
/// call sites. Both known tables ship as constructors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodNames {
    pub count: &'static str,
    pub record: &'static str,
    pub is_active: &'static str,
    pub create: &'static str,
    pub contribute: &'static str,
    pub finalize: &'static str,
    pub token_address: &'static str,
}

impl MethodNames {
    pub fn campaigns() -> Self {
        Self {
            count: "campaignCount()",
            record: "campaigns(uint256)",
            is_active: "isCampaignActive(uint256)",
            create: "createCampaign(string,uint256,uint256)",
            contribute: "contribute(uint256)",
            finalize: "finalizeCampaign(uint256)",
            token_address: "getTokenAddress()",
        }
    }

    pub fn events() -> Self {
        Self {
            count: "eventCount()",
            record: "events(uint256)",
            is_active: "isEventActive(uint256)",
            create: "createEvent(string,uint256,uint256)",
            contribute: "contribute(uint256)",
            finalize: "endEvent(uint256)",
            token_address: "getTokenAddress()",
        }
    }
}

/// Computes the 4-byte function selector of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Builds calldata from a canonical signature and ABI-encodable parameters.
pub fn encode_call<T: SolValue>(signature: &str, params: T) -> Vec<u8>
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    let mut data = selector(signature).to_vec();
    data.extend(params.abi_encode_params());
    data
}

/// The raw on-chain record of a campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignRecord {
    pub title: String,
    pub funding_goal: U256,
    pub funds_raised: U256,
    pub deadline: u64,
}

/// A submitted transaction that has not reached finality yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: B256,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

impl PendingTransaction {
    /// Awaits finality of the transaction, polling for its receipt. A receipt
    /// with a failed status surfaces as `CallFailure`; the effect is durable
    /// only once this returns successfully.
    pub async fn wait<P: WalletProvider>(
        &self,
        provider: &P,
    ) -> Result<TransactionReceipt, ClientError> {
        loop {
            let receipt: Option<TransactionReceipt> = provider
                .request("eth_getTransactionReceipt", json!([self.hash]))
                .await?;
            match receipt {
                Some(receipt) if receipt.succeeded() => return Ok(receipt),
                Some(receipt) => {
                    return Err(ClientError::CallFailure(format!(
                        "transaction {} reverted",
                        receipt.transaction_hash
                    )));
                }
                None => tokio::time::sleep(RECEIPT_POLL_INTERVAL).await,
            }
        }
    }
}

/// A typed call surface over the deployed crowdfunding contract.
///
/// A proxy binds a provider, the contract address, a method-name table, and
/// the caller account. It is rebuilt on every reconnect or chain change and
/// must never be reused across a chain switch.
pub struct ContractProxy<P> {
    provider: Arc<P>,
    pub address: Address,
    pub names: MethodNames,
    pub caller: Address,
}

impl<P: WalletProvider> ContractProxy<P> {
    pub fn new(provider: Arc<P>, address: Address, names: MethodNames, caller: Address) -> Self {
        Self {
            provider,
            address,
            names,
            caller,
        }
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let result: String = self
            .provider
            .request(
                "eth_call",
                json!([
                    {
                        "from": self.caller,
                        "to": to,
                        "data": hex::encode_prefixed(&data),
                    },
                    "latest",
                ]),
            )
            .await?;
        Ok(hex::decode(&result)?)
    }

    async fn send(
        &self,
        data: Vec<u8>,
        value: Option<U256>,
    ) -> Result<PendingTransaction, ClientError> {
        let mut transaction = json!({
            "from": self.caller,
            "to": self.address,
            "data": hex::encode_prefixed(&data),
        });
        if let Some(value) = value {
            transaction["value"] = json!(format!("0x{value:x}"));
        }
        let hash: B256 = self
            .provider
            .request("eth_sendTransaction", json!([transaction]))
            .await?;
        Ok(PendingTransaction { hash })
    }

    pub async fn campaign_count(&self) -> Result<u64, ClientError> {
        let data = selector(self.names.count).to_vec();
        let answer = self.call(self.address, data).await?;
        let (count,) = <(U256,)>::abi_decode_params(&answer)?;
        u64::try_from(count).map_err(|_| ClientError::ValueOutOfRange)
    }

    pub async fn campaign(&self, id: u64) -> Result<CampaignRecord, ClientError> {
        let data = encode_call(self.names.record, (U256::from(id),));
        let answer = self.call(self.address, data).await?;
        let (title, funding_goal, funds_raised, deadline) =
            <(String, U256, U256, U256)>::abi_decode_params(&answer)?;
        Ok(CampaignRecord {
            title,
            funding_goal,
            funds_raised,
            deadline: u64::try_from(deadline).map_err(|_| ClientError::ValueOutOfRange)?,
        })
    }

    pub async fn is_campaign_active(&self, id: u64) -> Result<bool, ClientError> {
        let data = encode_call(self.names.is_active, (U256::from(id),));
        let answer = self.call(self.address, data).await?;
        let (active,) = <(bool,)>::abi_decode_params(&answer)?;
        Ok(active)
    }

    /// The address of the reward-token contract, read from the crowdfunding
    /// contract itself.
    pub async fn token_address(&self) -> Result<Address, ClientError> {
        let data = selector(self.names.token_address).to_vec();
        let answer = self.call(self.address, data).await?;
        let (address,) = <(Address,)>::abi_decode_params(&answer)?;
        Ok(address)
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ClientError> {
        let data = encode_call(ERC20_BALANCE_OF, (owner,));
        let answer = self.call(token, data).await?;
        let (balance,) = <(U256,)>::abi_decode_params(&answer)?;
        Ok(balance)
    }

    pub async fn decimals(&self, token: Address) -> Result<u8, ClientError> {
        let data = selector(ERC20_DECIMALS).to_vec();
        let answer = self.call(token, data).await?;
        // `uint8` occupies a full word on the wire; decode wide and narrow.
        let (decimals,) = <(U256,)>::abi_decode_params(&answer)?;
        u8::try_from(decimals).map_err(|_| ClientError::ValueOutOfRange)
    }

    pub async fn create_campaign(
        &self,
        title: &str,
        goal: U256,
        duration_seconds: u64,
    ) -> Result<PendingTransaction, ClientError> {
        let data = encode_call(
            self.names.create,
            (title.to_string(), goal, U256::from(duration_seconds)),
        );
        self.send(data, None).await
    }

    /// Contributes to a campaign. The amount rides along as the transaction
    /// value.
    pub async fn contribute(
        &self,
        id: u64,
        amount: U256,
    ) -> Result<PendingTransaction, ClientError> {
        let data = encode_call(self.names.contribute, (U256::from(id),));
        self.send(data, Some(amount)).await
    }

    pub async fn finalize_campaign(&self, id: u64) -> Result<PendingTransaction, ClientError> {
        let data = encode_call(self.names.finalize, (U256::from(id),));
        self.send(data, None).await
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::{encode_call, selector, MethodNames, ERC20_BALANCE_OF, ERC20_DECIMALS};

    #[test]
    fn selectors_match_known_values() {
        // Well-known ERC-20 selectors.
        assert_eq!(selector(ERC20_BALANCE_OF), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector(ERC20_DECIMALS), [0x31, 0x3c, 0xe5, 0x67]);
    }

    #[test]
    fn calldata_layout() {
        let owner = Address::repeat_byte(0x42);
        let data = encode_call(ERC20_BALANCE_OF, (owner,));
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        // The address occupies the low-order 20 bytes of its word.
        assert_eq!(&data[16..36], owner.as_slice());

        let data = encode_call(
            MethodNames::campaigns().contribute,
            (U256::from(7u64),),
        );
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[35], 7);
    }

    #[test]
    fn naming_tables_differ_only_in_names() {
        let campaigns = MethodNames::campaigns();
        let events = MethodNames::events();
        assert_ne!(campaigns.count, events.count);
        assert_ne!(campaigns.create, events.create);
        assert_eq!(campaigns.contribute, events.contribute);
        assert_eq!(campaigns.token_address, events.token_address);
    }
}
