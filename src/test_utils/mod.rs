// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex as SyncMutex,
};

use alloy_primitives::{hex, B256, U256};
use alloy_sol_types::{abi::TokenSeq, SolType, SolValue};
use async_lock::Mutex;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::common::{ClientError, RpcErrorObject};
use crate::provider::WalletProvider;

/// A scripted wallet provider.
///
/// Responses are queued per method and consumed in FIFO order, so a test
/// primes exactly the RPC exchanges it expects. Requests are recorded for
/// assertions on call order. An exhausted queue answers with an RPC error so
/// an over-eager client fails loudly instead of hanging.
pub struct MockProvider {
    id: Mutex<u64>,
    responses: SyncMutex<HashMap<String, VecDeque<Result<Value, RpcErrorObject>>>>,
    requests: SyncMutex<Vec<String>>,
    available: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            id: Mutex::new(0),
            responses: SyncMutex::new(HashMap::new()),
            requests: SyncMutex::new(Vec::new()),
            available: true,
        }
    }

    /// A provider behaving as if no wallet extension were installed.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queues a successful result for the next call to `method`.
    pub fn expect(&self, method: &str, result: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(result));
    }

    /// Queues an RPC error object for the next call to `method`.
    pub fn expect_error(&self, method: &str, code: i64, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(RpcErrorObject {
                code,
                message: message.to_string(),
            }));
    }

    /// The methods requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// The number of queued responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses
            .lock()
            .unwrap()
            .values()
            .map(VecDeque::len)
            .sum()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn next_id(&self) -> u64 {
        let mut id = self.id.lock().await;
        *id += 1;
        *id
    }

    async fn request_inner(&self, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        if !self.available {
            return Err(ClientError::ProviderUnavailable);
        }
        let request: Value = serde_json::from_slice(&payload)?;
        let method = request["method"].as_str().unwrap_or_default().to_string();
        let id = request["id"].clone();
        self.requests.lock().unwrap().push(method.clone());
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);
        let response = match scripted {
            Some(Ok(result)) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Some(Err(error)) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
            None => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": -32601,
                    "message": format!("no scripted response for {method}"),
                },
            }),
        };
        Ok(serde_json::to_vec(&response)?)
    }
}

/// Encodes a value as the hex result of an `eth_call`.
pub fn abi_result<T: SolValue>(value: T) -> Value
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    Value::String(hex::encode_prefixed(value.abi_encode_params()))
}

/// The `eth_call` result for a campaign record.
pub fn campaign_result(title: &str, goal: U256, raised: U256, deadline: u64) -> Value {
    abi_result((title.to_string(), goal, raised, U256::from(deadline)))
}

/// A quantity result such as a balance or a count.
pub fn quantity_result(value: U256) -> Value {
    Value::String(format!("0x{value:x}"))
}

pub fn tx_hash_result(byte: u8) -> Value {
    Value::String(format!("{}", B256::repeat_byte(byte)))
}

/// A transaction receipt, included and either succeeded or reverted.
pub fn receipt_result(byte: u8, succeeded: bool) -> Value {
    json!({
        "transactionHash": format!("{}", B256::repeat_byte(byte)),
        "status": if succeeded { "0x1" } else { "0x0" },
    })
}
