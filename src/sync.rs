// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{
    utils::{format_units, ParseUnits},
    Address, U256, U512,
};
use tracing::warn;

use crate::{common::ClientError, contract::ContractProxy, provider::WalletProvider};

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// The native currency uses fixed 18-decimal precision.
pub const NATIVE_DECIMALS: u8 = 18;

/// A display record of one on-chain campaign. A read-only mirror: it is never
/// mutated locally, only replaced by re-fetching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Campaign {
    /// The index into the contract's campaign list. Indices are dense and
    /// stable.
    pub id: u64,
    pub title: String,
    pub funding_goal: U256,
    pub funds_raised: U256,
    /// Unix timestamp in seconds.
    pub deadline: u64,
    pub active: bool,
}

impl Campaign {
    /// Funding progress in percent, clamped to 100. A zero goal reads as 0%
    /// rather than a division fault.
    pub fn progress_percent(&self) -> u8 {
        if self.funding_goal.is_zero() {
            return 0;
        }
        if self.funds_raised >= self.funding_goal {
            return 100;
        }
        // raised < goal, so the widened quotient is below 100.
        let scaled: U512 = self.funds_raised.widening_mul(U256::from(100));
        (scaled / U512::from(self.funding_goal)).to::<u8>()
    }

    /// Whole days until the deadline, rounded up and clamped at zero.
    pub fn days_left(&self, now: u64) -> u64 {
        self.deadline.saturating_sub(now).div_ceil(SECONDS_PER_DAY)
    }
}

/// The most recently fetched balances of the session account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub native_balance: U256,
    pub token_balance: U256,
    pub token_decimals: u8,
}

impl BalanceSnapshot {
    pub fn display_native(&self) -> String {
        display_units(self.native_balance, NATIVE_DECIMALS)
    }

    pub fn display_token(&self) -> String {
        display_units(self.token_balance, self.token_decimals)
    }
}

fn display_units(amount: U256, decimals: u8) -> String {
    format_units(ParseUnits::U256(amount), decimals).unwrap_or_else(|_| amount.to_string())
}

/// Fetches the full campaign list from the contract.
///
/// The result always reflects the fetched count, but a failed per-index fetch
/// is logged and skipped rather than aborting the remaining indices, so the
/// result may be sparse. A count of zero yields an empty list, not an error.
pub async fn refresh<P: WalletProvider>(
    proxy: &ContractProxy<P>,
) -> Result<Vec<Campaign>, ClientError> {
    let count = proxy.campaign_count().await?;
    let mut campaigns = Vec::with_capacity(count as usize);
    for id in 0..count {
        match fetch_campaign(proxy, id).await {
            Ok(campaign) => campaigns.push(campaign),
            Err(error) => warn!(id, %error, "skipping campaign that failed to load"),
        }
    }
    Ok(campaigns)
}

async fn fetch_campaign<P: WalletProvider>(
    proxy: &ContractProxy<P>,
    id: u64,
) -> Result<Campaign, ClientError> {
    let record = proxy.campaign(id).await?;
    let active = proxy.is_campaign_active(id).await?;
    Ok(Campaign {
        id,
        title: record.title,
        funding_goal: record.funding_goal,
        funds_raised: record.funds_raised,
        deadline: record.deadline,
        active,
    })
}

/// Recomputes the balance snapshot for an account: the native balance from
/// the provider and the reward-token balance from the token contract.
pub async fn fetch_balances<P: WalletProvider>(
    provider: &P,
    proxy: &ContractProxy<P>,
    account: Address,
) -> Result<BalanceSnapshot, ClientError> {
    let native_balance = provider.get_balance(account).await?;
    let token = proxy.token_address().await?;
    let token_balance = proxy.balance_of(token, account).await?;
    let token_decimals = proxy.decimals(token).await?;
    Ok(BalanceSnapshot {
        native_balance,
        token_balance,
        token_decimals,
    })
}
