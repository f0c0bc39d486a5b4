// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, U256};
use async_lock::Mutex;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::common::{ChainId, ClientError, RpcErrorObject};

/// The EIP-1193 error code for a declined permission prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: T,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// A notification pushed by the wallet provider. Notifications arrive
/// asynchronously and in no guaranteed order relative to in-flight requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

/// The request surface of a wallet provider.
///
/// Implementations supply the transport (`request_inner`) and a shared
/// request-id counter; the JSON-RPC envelope handling and the standard wallet
/// queries are provided methods.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn next_id(&self) -> u64;

    async fn request_inner(&self, payload: Vec<u8>) -> Result<Vec<u8>, ClientError>;

    /// Sends a JSON-RPC request and decodes the result, validating the
    /// response envelope and mapping provider error objects into the error
    /// taxonomy.
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ClientError>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let id = self.next_id().await;
        let payload = serde_json::to_vec(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })?;
        let body = self.request_inner(payload).await?;
        let response: JsonRpcResponse = serde_json::from_slice(&body)?;
        if response.jsonrpc != "2.0" {
            return Err(ClientError::WrongJsonRpcVersion);
        }
        if response.id != id {
            return Err(ClientError::IdMismatch);
        }
        if let Some(error) = response.error {
            return Err(match error.code {
                USER_REJECTED_CODE => ClientError::UserRejected,
                _ => ClientError::Rpc(error),
            });
        }
        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    /// Prompts the user for access to their accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.request("eth_requestAccounts", json!([])).await
    }

    /// Returns the already-authorized accounts without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<ChainId, ClientError> {
        self.request("eth_chainId", json!([])).await
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ClientError> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }
}

/// A wallet provider reachable over HTTP, for node RPC endpoints and local
/// development chains.
pub struct HttpProvider {
    url: Url,
    client: reqwest::Client,
    id: Mutex<u64>,
}

impl HttpProvider {
    /// Connects to an existing JSON-RPC endpoint and creates an
    /// `HttpProvider` if the URL is valid.
    pub fn new(url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(url)?;
        Ok(Self {
            url,
            client: reqwest::Client::new(),
            id: Mutex::new(0),
        })
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn next_id(&self) -> u64 {
        let mut id = self.id.lock().await;
        *id += 1;
        *id
    }

    async fn request_inner(&self, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let response = self
            .client
            .post(self.url.clone())
            .body(payload)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let body = response.bytes().await?;
        Ok(body.as_ref().to_vec())
    }
}
