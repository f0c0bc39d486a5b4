// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use alloy_primitives::{
    utils::{parse_units, ParseUnits},
    Address, U256,
};
use tracing::{info, warn};

use crate::{
    common::{ChainId, ClientError},
    config::ClientConfig,
    contract::ContractProxy,
    network::ensure_chain,
    provider::{WalletEvent, WalletProvider},
    sync::{self, BalanceSnapshot, Campaign, NATIVE_DECIMALS, SECONDS_PER_DAY},
};

/// How long a success message stays visible.
pub const SUCCESS_CLEAR_DELAY: Duration = Duration::from_secs(5);
/// How long an error message stays visible.
pub const ERROR_CLEAR_DELAY: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    WrongNetwork,
}

/// The wallet session. Exactly one exists per controller; it is created on a
/// successful connection, mutated on account changes, and cleared when the
/// wallet reports zero accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub state: SessionState,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A scoped status message. Success and error messages auto-clear after a
/// fixed delay so stale banners never linger; info messages stay until
/// replaced.
#[derive(Clone, Debug)]
pub struct Status {
    pub text: String,
    pub severity: Severity,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct StatusLine {
    current: Option<Status>,
}

impl StatusLine {
    pub fn set(&mut self, severity: Severity, text: impl Into<String>, now: Instant) {
        let expires_at = match severity {
            Severity::Info => None,
            Severity::Success => Some(now + SUCCESS_CLEAR_DELAY),
            Severity::Error => Some(now + ERROR_CLEAR_DELAY),
        };
        self.current = Some(Status {
            text: text.into(),
            severity,
            expires_at,
        });
    }

    pub fn current(&self, now: Instant) -> Option<&Status> {
        self.current
            .as_ref()
            .filter(|status| status.expires_at.map_or(true, |expiry| now < expiry))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Orchestrates the wallet gateway, network guard, contract proxy, and sync
/// loop in response to user actions and wallet notifications.
///
/// Every user-facing action catches failures locally and renders them as a
/// status message; none of them return an error. Write actions are guarded:
/// they no-op with a visible message unless the session is connected.
pub struct SessionController<P> {
    provider: Arc<P>,
    config: ClientConfig,
    session: Session,
    proxy: Option<ContractProxy<P>>,
    campaigns: Vec<Campaign>,
    balances: Option<BalanceSnapshot>,
    status: StatusLine,
}

impl<P: WalletProvider> SessionController<P> {
    pub fn new(provider: Arc<P>, config: ClientConfig) -> Self {
        Self {
            provider,
            config,
            session: Session::default(),
            proxy: None,
            campaigns: Vec::new(),
            balances: None,
            status: StatusLine::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn balances(&self) -> Option<&BalanceSnapshot> {
        self.balances.as_ref()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> Option<&Status> {
        self.status.current(now)
    }

    /// Whether write actions are currently allowed.
    pub fn actions_enabled(&self) -> bool {
        self.session.is_connected()
    }

    /// Connects the wallet: prompts for account access, verifies the chain,
    /// binds the contract proxy, and loads campaigns and balances.
    pub async fn connect(&mut self) {
        self.session.state = SessionState::Connecting;
        let account = match self.provider.request_accounts().await {
            Ok(accounts) => match accounts.first().copied() {
                Some(account) => account,
                None => {
                    self.fail_connect(ClientError::ProviderUnavailable);
                    return;
                }
            },
            Err(error) => {
                self.fail_connect(error);
                return;
            }
        };
        self.establish(account).await;
    }

    /// Processes a notification from the wallet provider. Notifications may
    /// arrive at any time relative to user actions.
    pub async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => self.reset(),
                Some(account) => {
                    // Without an established session there is nothing to
                    // rebind; ignore stray notifications.
                    if self.session.state == SessionState::Disconnected {
                        return;
                    }
                    self.session.account = Some(account);
                    if self.session.is_connected() {
                        if let Some(proxy) = self.proxy.take() {
                            self.proxy = Some(ContractProxy::new(
                                self.provider.clone(),
                                proxy.address,
                                proxy.names,
                                account,
                            ));
                        }
                        if let Err(error) = self.refresh_data().await {
                            warn!(%error, "refresh after account change failed");
                        }
                    }
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                info!(%chain_id, "chain changed, reinitializing session");
                self.reinitialize().await;
            }
        }
    }

    /// Invalidates all bindings and re-runs initialization. This is the
    /// explicit equivalent of the page reload a browser client performs on a
    /// chain change; a stale proxy is never reused across a switch.
    async fn reinitialize(&mut self) {
        self.proxy = None;
        self.campaigns.clear();
        self.balances = None;
        self.session = Session::default();
        let accounts = match self.provider.accounts().await {
            Ok(accounts) => accounts,
            Err(error) => {
                warn!(%error, "could not read accounts while reinitializing");
                return;
            }
        };
        match accounts.first().copied() {
            Some(account) => {
                self.session.state = SessionState::Connecting;
                self.establish(account).await;
            }
            None => (),
        }
    }

    async fn establish(&mut self, account: Address) {
        match ensure_chain(self.provider.as_ref(), &self.config.chain).await {
            Ok(()) => (),
            Err(error @ ClientError::NetworkMismatch { .. }) => {
                self.session.account = Some(account);
                self.session.state = SessionState::WrongNetwork;
                self.set_error(format!("Connection failed: {error}"));
                return;
            }
            Err(error) => {
                self.fail_connect(error);
                return;
            }
        }
        self.session = Session {
            account: Some(account),
            chain_id: Some(self.config.chain.chain_id),
            state: SessionState::Connected,
        };
        self.proxy = Some(ContractProxy::new(
            self.provider.clone(),
            self.config.contract_address,
            self.config.naming.method_names(),
            account,
        ));
        if let Err(error) = self.refresh_data().await {
            self.set_error(format!("Failed to load campaigns: {error}"));
            return;
        }
        self.set_success("Wallet connected successfully!");
    }

    fn fail_connect(&mut self, error: ClientError) {
        self.session = Session::default();
        self.set_error(format!("Connection failed: {error}"));
    }

    pub async fn create_campaign(&mut self, title: &str, goal: &str, duration_days: u64) {
        let Some(account) = self.guard() else { return };
        if title.trim().is_empty() || goal.trim().is_empty() {
            self.set_error("Please fill all fields");
            return;
        }
        self.set_info("Creating campaign...");
        match self.try_create(account, title, goal, duration_days).await {
            Ok(true) => self.set_success(format!("Campaign \"{}\" created successfully!", title)),
            Ok(false) => (),
            Err(error) => self.set_error(format!("Failed to create: {error}")),
        }
    }

    async fn try_create(
        &mut self,
        account: Address,
        title: &str,
        goal: &str,
        duration_days: u64,
    ) -> Result<bool, ClientError> {
        let goal = parse_native_amount(goal)?;
        let duration_seconds = duration_days
            .checked_mul(SECONDS_PER_DAY)
            .ok_or(ClientError::ValueOutOfRange)?;
        let pending = self
            .proxy()?
            .create_campaign(title.trim(), goal, duration_seconds)
            .await?;
        pending.wait(self.provider.as_ref()).await?;
        self.settle(account).await
    }

    pub async fn contribute(&mut self, id: u64, amount: &str) {
        let Some(account) = self.guard() else { return };
        if amount.trim().is_empty() {
            self.set_error("Please fill all fields");
            return;
        }
        self.set_info(format!("Contributing {amount} ETH..."));
        match self.try_contribute(account, id, amount).await {
            Ok(true) => {
                self.set_success(format!("Successfully contributed {amount} ETH! Tokens minted."))
            }
            Ok(false) => (),
            Err(error) => self.set_error(format!("Failed to contribute: {error}")),
        }
    }

    async fn try_contribute(
        &mut self,
        account: Address,
        id: u64,
        amount: &str,
    ) -> Result<bool, ClientError> {
        let amount = parse_native_amount(amount)?;
        let pending = self.proxy()?.contribute(id, amount).await?;
        pending.wait(self.provider.as_ref()).await?;
        self.settle(account).await
    }

    pub async fn finalize(&mut self, id: u64) {
        let Some(account) = self.guard() else { return };
        self.set_info("Finalizing campaign...");
        match self.try_finalize(account, id).await {
            Ok(true) => self.set_success("Campaign finalized!"),
            Ok(false) => (),
            Err(error) => self.set_error(format!("Failed to finalize: {error}")),
        }
    }

    async fn try_finalize(&mut self, account: Address, id: u64) -> Result<bool, ClientError> {
        let pending = self.proxy()?.finalize_campaign(id).await?;
        pending.wait(self.provider.as_ref()).await?;
        self.settle(account).await
    }

    /// Re-reads campaigns and balances from the chain.
    pub async fn refresh(&mut self) {
        if self.guard().is_none() {
            return;
        }
        self.set_info("Loading campaigns...");
        match self.refresh_data().await {
            Ok(()) => self.status.clear(),
            Err(error) => self.set_error(format!("Failed to load campaigns: {error}")),
        }
    }

    /// Applies the effects of a finished write action, unless the session
    /// changed while the transaction was in flight; results computed against
    /// a stale session are dropped.
    async fn settle(&mut self, account: Address) -> Result<bool, ClientError> {
        if !self.session.is_connected() || self.session.account != Some(account) {
            warn!("session changed mid-action, dropping stale result");
            return Ok(false);
        }
        self.refresh_data().await?;
        Ok(true)
    }

    async fn refresh_data(&mut self) -> Result<(), ClientError> {
        let Some(account) = self.session.account else {
            return Ok(());
        };
        let proxy = self.proxy()?;
        let campaigns = sync::refresh(proxy).await?;
        // Balance failures are logged, not fatal: the campaign list is still
        // useful without them.
        let balances = match sync::fetch_balances(self.provider.as_ref(), proxy, account).await {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(%error, "balance update failed");
                self.balances.clone()
            }
        };
        self.campaigns = campaigns;
        self.balances = balances;
        Ok(())
    }

    fn proxy(&self) -> Result<&ContractProxy<P>, ClientError> {
        self.proxy
            .as_ref()
            .ok_or_else(|| ClientError::CallFailure("no contract binding".to_string()))
    }

    fn guard(&mut self) -> Option<Address> {
        match self.session.account.filter(|_| self.session.is_connected()) {
            Some(account) => Some(account),
            None => {
                self.set_error("Connect your wallet first");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.session = Session::default();
        self.proxy = None;
        self.campaigns.clear();
        self.balances = None;
        self.set_info("Wallet disconnected");
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.status.set(Severity::Info, text, Instant::now());
    }

    fn set_success(&mut self, text: impl Into<String>) {
        self.status.set(Severity::Success, text, Instant::now());
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status.set(Severity::Error, text, Instant::now());
    }
}

/// Parses a decimal amount of the native currency into base units. Signed
/// input parses as a signed quantity, so negative amounts are rejected here
/// rather than reinterpreted as huge unsigned values.
pub fn parse_native_amount(input: &str) -> Result<U256, ClientError> {
    match parse_units(input.trim(), NATIVE_DECIMALS)? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(value) if !value.is_negative() => Ok(value.into_raw()),
        ParseUnits::I256(_) => Err(ClientError::NegativeAmount),
    }
}
