// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
This crate is the client for the crowdfunding dApp: it manages the wallet
session, verifies the active network, talks to the deployed contract through
a typed call surface, and refreshes campaign state into display records.

The wallet is reached through the [`provider::WalletProvider`] trait, an
EIP-1193-style JSON-RPC surface; [`session::SessionController`] orchestrates
connection, network verification, and the read/refresh cycle on top of it.
*/

pub mod common;
pub mod config;
pub mod contract;
pub mod network;
pub mod provider;
pub mod session;
pub mod sync;

/// Helper types for tests.
pub mod test_utils;
