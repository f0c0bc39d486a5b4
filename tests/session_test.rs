// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use crowdfund_client::{
    common::ChainId,
    config::ClientConfig,
    provider::WalletEvent,
    session::{SessionController, SessionState, Severity},
    test_utils::{
        abi_result, campaign_result, quantity_result, receipt_result, tx_hash_result, MockProvider,
    },
};
use serde_json::json;

const FAR_FUTURE: u64 = 4_000_000_000;

fn account() -> Address {
    Address::repeat_byte(0x11)
}

fn token() -> Address {
    Address::repeat_byte(0x77)
}

fn config() -> ClientConfig {
    ClientConfig::new(Address::repeat_byte(0xc0))
}

fn one_ether() -> U256 {
    U256::from(10u64).pow(U256::from(18u64))
}

/// Queues the `eth_call`s of one full refresh cycle: the campaign count, a
/// record and active flag per campaign, and the balance lookups.
fn prime_refresh(provider: &MockProvider, campaigns: &[(&str, u64, u64, bool)], native: U256) {
    provider.expect("eth_call", abi_result((U256::from(campaigns.len()),)));
    for (title, goal, raised, active) in campaigns {
        provider.expect(
            "eth_call",
            campaign_result(title, U256::from(*goal), U256::from(*raised), FAR_FUTURE),
        );
        provider.expect("eth_call", abi_result((*active,)));
    }
    provider.expect("eth_getBalance", quantity_result(native));
    provider.expect("eth_call", abi_result((token(),)));
    provider.expect("eth_call", abi_result((U256::from(500u64),)));
    provider.expect("eth_call", abi_result((U256::from(18u64),)));
}

fn prime_connect(provider: &MockProvider, campaigns: &[(&str, u64, u64, bool)]) {
    provider.expect("eth_requestAccounts", json!([account()]));
    provider.expect("eth_chainId", json!("0xaa36a7"));
    prime_refresh(provider, campaigns, one_ether());
}

async fn connected_controller(
    campaigns: &[(&str, u64, u64, bool)],
) -> (Arc<MockProvider>, SessionController<MockProvider>) {
    let provider = Arc::new(MockProvider::new());
    prime_connect(&provider, campaigns);
    let mut controller = SessionController::new(provider.clone(), config());
    controller.connect().await;
    assert_eq!(controller.session().state, SessionState::Connected);
    (provider, controller)
}

#[tokio::test]
async fn connect_happy_path() {
    let (provider, controller) =
        connected_controller(&[("Well", 100, 40, true), ("Bridge", 200, 200, false)]).await;

    let session = controller.session();
    assert_eq!(session.account, Some(account()));
    assert_eq!(session.chain_id, Some(ChainId(0xaa36a7)));
    assert!(controller.actions_enabled());

    let campaigns = controller.campaigns();
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0].id, 0);
    assert_eq!(campaigns[0].title, "Well");
    assert_eq!(campaigns[0].progress_percent(), 40);
    assert!(campaigns[0].active);
    assert_eq!(campaigns[1].id, 1);
    assert_eq!(campaigns[1].progress_percent(), 100);
    assert!(!campaigns[1].active);

    let balances = controller.balances().unwrap();
    assert_eq!(balances.native_balance, one_ether());
    assert_eq!(balances.token_balance, U256::from(500u64));
    assert_eq!(balances.token_decimals, 18);

    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Success);
    assert!(status.text.contains("connected"));
    assert_eq!(provider.pending(), 0);
}

#[tokio::test]
async fn connect_with_no_campaigns_yields_empty_list() {
    let (_provider, controller) = connected_controller(&[]).await;
    assert!(controller.campaigns().is_empty());
    assert!(controller.session().is_connected());
    assert_eq!(
        controller.status().unwrap().severity,
        Severity::Success
    );
}

#[tokio::test]
async fn connect_without_wallet_disables_everything() {
    let provider = Arc::new(MockProvider::unavailable());
    let mut controller = SessionController::new(provider.clone(), config());
    controller.connect().await;

    assert_eq!(controller.session().state, SessionState::Disconnected);
    assert!(!controller.actions_enabled());
    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.text.contains("no wallet provider"));

    controller.create_campaign("Well", "1", 30).await;
    assert!(controller.status().unwrap().text.contains("Connect your wallet"));
}

#[tokio::test]
async fn connect_when_prompt_is_declined() {
    let provider = Arc::new(MockProvider::new());
    provider.expect_error("eth_requestAccounts", 4001, "user rejected");
    let mut controller = SessionController::new(provider.clone(), config());
    controller.connect().await;

    assert_eq!(controller.session().state, SessionState::Disconnected);
    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.text.contains("rejected"));
}

#[tokio::test]
async fn wrong_network_disables_writes_until_switch_succeeds() {
    let provider = Arc::new(MockProvider::new());
    provider.expect("eth_requestAccounts", json!([account()]));
    provider.expect("eth_chainId", json!("0x1"));
    provider.expect_error("wallet_switchEthereumChain", 4001, "user rejected");
    let mut controller = SessionController::new(provider.clone(), config());
    controller.connect().await;

    assert_eq!(controller.session().state, SessionState::WrongNetwork);
    assert!(!controller.actions_enabled());

    // Guarded actions no-op with a visible message and no transaction.
    controller.create_campaign("Well", "1", 30).await;
    assert!(controller.status().unwrap().text.contains("Connect your wallet"));
    assert!(!provider.requests().contains(&"eth_sendTransaction".to_string()));

    // A later connect with a successful switch re-enables everything.
    provider.expect("eth_requestAccounts", json!([account()]));
    provider.expect("eth_chainId", json!("0x1"));
    provider.expect("wallet_switchEthereumChain", serde_json::Value::Null);
    prime_refresh(&provider, &[], one_ether());
    controller.connect().await;

    assert_eq!(controller.session().state, SessionState::Connected);
    assert!(controller.actions_enabled());
}

#[tokio::test]
async fn refresh_skips_an_index_that_fails_to_load() {
    let provider = Arc::new(MockProvider::new());
    provider.expect("eth_requestAccounts", json!([account()]));
    provider.expect("eth_chainId", json!("0xaa36a7"));
    // Five campaigns; the record fetch for index 2 reverts.
    provider.expect("eth_call", abi_result((U256::from(5u64),)));
    for index in [0u64, 1] {
        provider.expect(
            "eth_call",
            campaign_result(&format!("c{index}"), U256::from(100u64), U256::ZERO, FAR_FUTURE),
        );
        provider.expect("eth_call", abi_result((true,)));
    }
    provider.expect_error("eth_call", -32000, "execution reverted");
    for index in [3u64, 4] {
        provider.expect(
            "eth_call",
            campaign_result(&format!("c{index}"), U256::from(100u64), U256::ZERO, FAR_FUTURE),
        );
        provider.expect("eth_call", abi_result((true,)));
    }
    provider.expect("eth_getBalance", quantity_result(one_ether()));
    provider.expect("eth_call", abi_result((token(),)));
    provider.expect("eth_call", abi_result((U256::ZERO,)));
    provider.expect("eth_call", abi_result((U256::from(18u64),)));

    let mut controller = SessionController::new(provider.clone(), config());
    controller.connect().await;

    let ids: Vec<u64> = controller.campaigns().iter().map(|c| c.id).collect();
    assert_eq!(ids, [0, 1, 3, 4]);
    let titles: Vec<&str> = controller
        .campaigns()
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, ["c0", "c1", "c3", "c4"]);
    assert_eq!(provider.pending(), 0);
}

#[tokio::test]
async fn create_campaign_waits_for_finality_then_refreshes() {
    let (provider, mut controller) = connected_controller(&[]).await;

    provider.expect("eth_sendTransaction", tx_hash_result(0xaa));
    provider.expect("eth_getTransactionReceipt", receipt_result(0xaa, true));
    prime_refresh(&provider, &[("Well", 100, 0, true)], one_ether());

    controller.create_campaign("Well", "1.5", 30).await;

    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Success);
    assert!(status.text.contains("created"));
    assert_eq!(controller.campaigns().len(), 1);
    assert_eq!(
        provider
            .requests()
            .iter()
            .filter(|method| *method == "eth_sendTransaction")
            .count(),
        1
    );
    assert_eq!(provider.pending(), 0);
}

#[tokio::test]
async fn reverted_contribution_surfaces_the_failure() {
    let (provider, mut controller) = connected_controller(&[("Well", 100, 0, true)]).await;

    provider.expect("eth_sendTransaction", tx_hash_result(0xbb));
    provider.expect("eth_getTransactionReceipt", receipt_result(0xbb, false));

    controller.contribute(0, "0.5").await;

    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.text.contains("reverted"));
    // The stale campaign list is untouched.
    assert_eq!(controller.campaigns().len(), 1);
}

#[tokio::test]
async fn finalize_reports_success() {
    let (provider, mut controller) = connected_controller(&[("Well", 100, 100, true)]).await;

    provider.expect("eth_sendTransaction", tx_hash_result(0xcc));
    provider.expect("eth_getTransactionReceipt", receipt_result(0xcc, true));
    prime_refresh(&provider, &[("Well", 100, 100, false)], one_ether());

    controller.finalize(0).await;

    assert_eq!(controller.status().unwrap().severity, Severity::Success);
    assert!(!controller.campaigns()[0].active);
}

#[tokio::test]
async fn malformed_inputs_never_reach_the_chain() {
    let (provider, mut controller) = connected_controller(&[]).await;

    controller.create_campaign("", "1", 30).await;
    assert!(controller.status().unwrap().text.contains("fill all fields"));

    controller.create_campaign("Well", "not a number", 30).await;
    assert_eq!(controller.status().unwrap().severity, Severity::Error);

    controller.contribute(0, "").await;
    assert!(controller.status().unwrap().text.contains("fill all fields"));

    // Negative amounts are rejected before any transaction is built.
    controller.contribute(0, "-1").await;
    let status = controller.status().unwrap();
    assert_eq!(status.severity, Severity::Error);
    assert!(status.text.contains("negative"));

    controller.create_campaign("Well", "-0.5", 30).await;
    assert_eq!(controller.status().unwrap().severity, Severity::Error);

    assert!(!provider.requests().contains(&"eth_sendTransaction".to_string()));
}

#[tokio::test]
async fn zero_accounts_event_resets_the_session() {
    let (_provider, mut controller) =
        connected_controller(&[("Well", 100, 40, true)]).await;
    assert!(!controller.campaigns().is_empty());

    controller
        .handle_event(WalletEvent::AccountsChanged(vec![]))
        .await;

    assert_eq!(controller.session().state, SessionState::Disconnected);
    assert_eq!(controller.session().account, None);
    assert!(controller.campaigns().is_empty());
    assert!(controller.balances().is_none());
    assert!(!controller.actions_enabled());
}

#[tokio::test]
async fn account_event_while_disconnected_is_ignored() {
    let provider = Arc::new(MockProvider::new());
    let mut controller = SessionController::new(provider.clone(), config());

    controller
        .handle_event(WalletEvent::AccountsChanged(vec![account()]))
        .await;

    assert_eq!(controller.session().state, SessionState::Disconnected);
    assert_eq!(controller.session().account, None);
    assert!(!controller.actions_enabled());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn account_switch_rebinds_and_refreshes() {
    let (provider, mut controller) = connected_controller(&[]).await;
    let other = Address::repeat_byte(0x22);

    prime_refresh(&provider, &[("Well", 100, 40, true)], one_ether());
    controller
        .handle_event(WalletEvent::AccountsChanged(vec![other]))
        .await;

    assert_eq!(controller.session().account, Some(other));
    assert!(controller.session().is_connected());
    assert_eq!(controller.campaigns().len(), 1);
    assert_eq!(provider.pending(), 0);
}

#[tokio::test]
async fn chain_change_reinitializes_the_session() {
    let (provider, mut controller) = connected_controller(&[("Old", 100, 0, true)]).await;

    // Reinitialization reads the authorized accounts without prompting, then
    // re-runs the connect routine against fresh bindings.
    provider.expect("eth_accounts", json!([account()]));
    provider.expect("eth_chainId", json!("0xaa36a7"));
    prime_refresh(&provider, &[("New", 100, 0, true)], one_ether());

    controller
        .handle_event(WalletEvent::ChainChanged(ChainId(1)))
        .await;

    assert!(controller.session().is_connected());
    assert_eq!(controller.campaigns().len(), 1);
    assert_eq!(controller.campaigns()[0].title, "New");
    assert!(provider.requests().contains(&"eth_accounts".to_string()));
    assert_eq!(provider.pending(), 0);
}

#[tokio::test]
async fn chain_change_without_authorized_accounts_disconnects() {
    let (provider, mut controller) = connected_controller(&[]).await;

    provider.expect("eth_accounts", json!([]));
    controller
        .handle_event(WalletEvent::ChainChanged(ChainId(1)))
        .await;

    assert_eq!(controller.session().state, SessionState::Disconnected);
    assert!(controller.campaigns().is_empty());
}

#[tokio::test]
async fn refresh_when_disconnected_is_a_guarded_noop() {
    let provider = Arc::new(MockProvider::new());
    let mut controller = SessionController::new(provider.clone(), config());

    controller.refresh().await;

    assert!(controller.status().unwrap().text.contains("Connect your wallet"));
    assert!(provider.requests().is_empty());
}
