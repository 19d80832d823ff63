// common/tests/quickstart_flow.rs

//! The create → [airdrop] → send sequence and its error boundary, driven
//! through recording in-memory backends.

use async_trait::async_trait;
use common::{
    run_quickstart, ApiKey, Checkpoint, Config, CreateWallet, FundingNetwork, QuickstartError,
    SignerDescriptor, Transaction, Transfer, Wallet, WalletProvider, API_KEY_VAR, RECIPIENT_VAR,
};
use solana_sdk::{hash::Hash, native_token::LAMPORTS_PER_SOL, signature::Signature};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateWallet(CreateWallet),
    RequestAirdrop { address: String, lamports: u64 },
    LatestCheckpoint,
    Confirm(Signature),
    Send(Transfer),
}

#[derive(Clone, Default)]
struct Backend {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_send: bool,
    fail_confirm: bool,
}

impl Backend {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for Backend {
    async fn create_wallet(
        &self,
        _api_key: &ApiKey,
        request: &CreateWallet,
    ) -> Result<Wallet, QuickstartError> {
        self.record(Call::CreateWallet(request.clone()));
        Ok(Wallet {
            chain: "solana".into(),
            address: "ABC123".into(),
        })
    }

    async fn send(
        &self,
        _api_key: &ApiKey,
        _wallet: &Wallet,
        transfer: &Transfer,
    ) -> Result<Transaction, QuickstartError> {
        self.record(Call::Send(transfer.clone()));
        if self.fail_send {
            return Err(QuickstartError::ExternalService {
                service: common::Service::WalletProvider,
                message: "insufficient funds".into(),
            });
        }
        Ok(Transaction {
            id: "TX1".into(),
            hash: None,
            explorer_link: Some("http://example/tx1".into()),
        })
    }
}

#[async_trait]
impl FundingNetwork for Backend {
    async fn request_airdrop(
        &self,
        address: &str,
        lamports: u64,
    ) -> Result<Signature, QuickstartError> {
        self.record(Call::RequestAirdrop {
            address: address.to_string(),
            lamports,
        });
        Ok(Signature::default())
    }

    async fn latest_checkpoint(&self) -> Result<Checkpoint, QuickstartError> {
        self.record(Call::LatestCheckpoint);
        Ok(Checkpoint {
            blockhash: Hash::default(),
            last_valid_block_height: 100,
        })
    }

    async fn confirm(
        &self,
        signature: &Signature,
        _checkpoint: &Checkpoint,
    ) -> Result<(), QuickstartError> {
        self.record(Call::Confirm(*signature));
        if self.fail_confirm {
            return Err(QuickstartError::ExternalService {
                service: common::Service::SolanaRpc,
                message: "block height exceeded".into(),
            });
        }
        Ok(())
    }
}

fn config(pairs: &[(&str, &str)], fund: bool) -> Result<Config, QuickstartError> {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(
        |var| {
            pairs
                .iter()
                .find(|(k, _)| k.as_str() == var)
                .map(|(_, v)| v.clone())
        },
        fund,
    )
}

fn valid(fund: bool) -> Result<Config, QuickstartError> {
    config(
        &[(API_KEY_VAR, "sk_staging_test"), (RECIPIENT_VAR, "Recip1ent999")],
        fund,
    )
}

struct Run {
    result: Result<common::Receipt, QuickstartError>,
    out: String,
    err: String,
}

async fn run(cfg: Result<Config, QuickstartError>, backend: &Backend) -> Run {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let b = backend.clone();
    let result = run_quickstart(cfg, move |_| Ok((b.clone(), b)), &mut out, &mut err).await;
    Run {
        result,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn expected_wallet_request() -> Call {
    Call::CreateWallet(CreateWallet {
        chain: "solana".into(),
        signer: SignerDescriptor::ApiKey,
    })
}

#[tokio::test]
async fn send_only_creates_wallet_then_sends() {
    let backend = Backend::default();
    let Run { result, out, err } = run(valid(false), &backend).await;

    let receipt = result.unwrap();
    assert_eq!(receipt.transaction.id, "TX1");
    assert!(receipt.airdrop.is_none());

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], expected_wallet_request());
    match &calls[1] {
        Call::Send(transfer) => {
            assert_eq!(transfer.recipient, "Recip1ent999");
            assert_eq!(transfer.amount.as_str(), "0.001");
        }
        other => panic!("expected send, got {other:?}"),
    }

    assert!(out.contains("[Crossmint Quickstart] 🚀 Starting wallet creation..."));
    assert!(out.contains("ABC123"));
    assert!(out.contains("TX1"));
    assert!(out.contains("http://example/tx1"));
    assert!(out.contains("Sending 0.001 SOL to Recip1..."));
    assert!(err.is_empty());
}

#[tokio::test]
async fn funded_variant_airdrops_once_and_confirms_before_sending() {
    let backend = Backend::default();
    let Run { result, out, .. } = run(valid(true), &backend).await;

    let receipt = result.unwrap();
    assert_eq!(receipt.airdrop, Some(Signature::default()));

    let calls = backend.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], expected_wallet_request());
    assert_eq!(
        calls[1],
        Call::RequestAirdrop {
            address: "ABC123".into(),
            lamports: LAMPORTS_PER_SOL,
        }
    );
    assert_eq!(calls[2], Call::LatestCheckpoint);
    assert_eq!(calls[3], Call::Confirm(Signature::default()));
    assert!(matches!(calls[4], Call::Send(_)));

    assert!(out.contains("💧 Requesting airdrop of 1 SOL to ABC123"));
    assert!(out.contains("✅ Airdrop confirmed!"));
}

#[tokio::test]
async fn missing_recipient_fails_without_touching_the_network() {
    let backend = Backend::default();
    let connected = Arc::new(Mutex::new(false));
    let flag = connected.clone();
    let b = backend.clone();
    let mut out = Vec::new();
    let mut errors = Vec::new();

    let result = run_quickstart(
        config(&[(API_KEY_VAR, "sk_staging_test")], true),
        move |_| {
            *flag.lock().unwrap() = true;
            Ok((b.clone(), b))
        },
        &mut out,
        &mut errors,
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_configuration());
    assert!(!*connected.lock().unwrap());
    assert!(backend.calls().is_empty());

    assert!(out.is_empty());
    let errors = String::from_utf8(errors).unwrap();
    assert!(errors.contains("❌ An error occurred"));
    assert!(errors.contains("RECIPIENT_ADDRESS"));
}

#[tokio::test]
async fn rejected_send_is_caught_by_the_boundary() {
    let backend = Backend {
        fail_send: true,
        ..Backend::default()
    };
    let Run { result, out, err } = run(valid(false), &backend).await;

    assert!(matches!(
        result,
        Err(QuickstartError::ExternalService { .. })
    ));
    assert!(out.contains("✅ Wallet created successfully!"));
    assert!(!out.contains("Transaction sent successfully"));
    assert!(!out.contains("❌"));
    assert!(err.contains("❌ An error occurred"));
    assert!(err.contains("insufficient funds"));
}

#[tokio::test]
async fn unconfirmed_airdrop_stops_before_send() {
    let backend = Backend {
        fail_confirm: true,
        ..Backend::default()
    };
    let Run { result, err, .. } = run(valid(true), &backend).await;

    assert!(result.is_err());
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::Send(_))));
    assert!(err.contains("block height exceeded"));
}

#[tokio::test]
async fn configured_token_and_amount_reach_the_provider() {
    let backend = Backend::default();
    let cfg = config(
        &[
            (API_KEY_VAR, "sk_staging_test"),
            (RECIPIENT_VAR, "Recip1ent999"),
            ("TRANSFER_TOKEN", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            ("TRANSFER_AMOUNT", "12.345678"),
        ],
        false,
    );
    let Run { result, out, .. } = run(cfg, &backend).await;
    result.unwrap();

    let sent = backend
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Send(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(sent.amount.as_str(), "12.345678");
    assert_eq!(
        sent.token.to_string(),
        "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
    );
    assert!(out.contains("Sending 12.345678 of token EPjFWdd5"));
}
