// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deploys the crowdfunding contract (which deploys its reward token) and
//! prints both addresses for manual insertion into the client configuration.

use std::{path::PathBuf, sync::Arc};

use alloy_primitives::{Address, B256};
use anyhow::{bail, Context as _};
use clap::Parser;
use crowdfund_client::{
    contract::{ContractProxy, MethodNames, PendingTransaction},
    provider::{HttpProvider, WalletProvider as _},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "crowdfund-deploy", about = "Deploy the crowdfunding contracts")]
struct Options {
    /// The JSON-RPC endpoint of the target chain.
    #[arg(long, default_value = "http://localhost:8545")]
    rpc_url: String,

    /// The account paying for the deployment. Defaults to the node's first
    /// unlocked account.
    #[arg(long)]
    from: Option<Address>,

    /// Path to the compiled contract artifact containing the creation
    /// bytecode.
    #[arg(long)]
    artifact: PathBuf,

    /// Use the legacy `events` method naming when querying the deployed
    /// contract.
    #[arg(long)]
    legacy_naming: bool,
}

#[derive(Deserialize)]
struct Artifact {
    bytecode: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let options = Options::parse();

    let provider = Arc::new(HttpProvider::new(&options.rpc_url)?);
    let from = match options.from {
        Some(from) => from,
        None => {
            let accounts = provider.accounts().await?;
            *accounts
                .first()
                .context("the node exposes no unlocked accounts; pass --from")?
        }
    };

    let contents = std::fs::read_to_string(&options.artifact)
        .with_context(|| format!("reading {}", options.artifact.display()))?;
    let artifact: Artifact = serde_json::from_str(&contents)?;

    println!("Deploying Crowdfunding contract...");
    let hash: B256 = provider
        .request(
            "eth_sendTransaction",
            json!([{ "from": from, "data": artifact.bytecode }]),
        )
        .await?;
    let receipt = PendingTransaction { hash }.wait(provider.as_ref()).await?;
    let Some(address) = receipt.contract_address else {
        bail!("deployment receipt carries no contract address");
    };

    let names = if options.legacy_naming {
        MethodNames::events()
    } else {
        MethodNames::campaigns()
    };
    let proxy = ContractProxy::new(provider.clone(), address, names, from);
    let token_address = proxy.token_address().await?;

    println!("Contracts deployed successfully!");
    println!("======================================");
    println!("Crowdfunding contract: {address}");
    println!("RewardToken contract:  {token_address}");
    println!("======================================");
    println!();
    println!("Update the client configuration with:");
    println!("contract_address = \"{address}\"");
    Ok(())
}
