// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The identifier of an EVM network, as reported by `eth_chainId`.
///
/// Wallet providers exchange chain identifiers as `0x`-prefixed hexadecimal
/// strings, so that is the serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn as_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl FromStr for ChainId {
    type Err = ClientError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let value = match input.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => input.parse::<u64>(),
        };
        value
            .map(ChainId)
            .map_err(|_| ClientError::InvalidChainId(input.to_string()))
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// The error object of a JSON-RPC response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// No wallet extension is present in the host environment.
    #[error("no wallet provider is available")]
    ProviderUnavailable,

    /// The user declined a wallet prompt. Recoverable by retrying.
    #[error("the user rejected the request")]
    UserRejected,

    /// The wallet is on the wrong chain and the user declined to switch.
    #[error("connected to chain {actual}, expected {expected}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },

    /// An RPC call or contract transaction failed; the underlying message is
    /// surfaced verbatim.
    #[error("contract call failed: {0}")]
    CallFailure(String),

    /// An error object returned by the provider.
    #[error("RPC error: {0}")]
    Rpc(RpcErrorObject),

    /// The response id does not match the request id.
    #[error("mismatched JSON-RPC response id")]
    IdMismatch,

    /// Wrong JSON-RPC version in the response envelope.
    #[error("wrong JSON-RPC version")]
    WrongJsonRpcVersion,

    #[error("invalid chain identifier: {0}")]
    InvalidChainId(String),

    #[error("numeric value out of range")]
    ValueOutOfRange,

    #[error("amounts must not be negative")]
    NegativeAmount,

    /// `serde_json` error
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// HTTP transport error
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),

    /// URL parsing error
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    /// Hex parsing error
    #[error(transparent)]
    FromHexError(#[from] alloy_primitives::hex::FromHexError),

    /// ABI decoding error
    #[error(transparent)]
    AbiError(#[from] alloy_sol_types::Error),

    /// Decimal amount parsing error
    #[error(transparent)]
    UnitsError(#[from] alloy_primitives::utils::UnitsError),

    /// I/O error
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
