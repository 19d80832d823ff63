// common/src/lib.rs
use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    native_token::LAMPORTS_PER_SOL,
    pubkey::{ParsePubkeyError, Pubkey},
    signature::Signature,
};
use std::env;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PREFIX: &str = "[Crossmint Quickstart]";

/// Chain every quickstart wallet is created on.
pub const SOLANA_CHAIN: &str = "solana";

// ─────────────────── Errors ───────────────────

/// Which remote party an [`QuickstartError::ExternalService`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    WalletProvider,
    SolanaRpc,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::WalletProvider => f.write_str("Crossmint wallet API"),
            Service::SolanaRpc => f.write_str("Solana RPC"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QuickstartError {
    /// A required setting is absent or a setting could not be parsed.
    /// Always raised before any network call.
    #[error("configuration error: {var} {reason}")]
    Configuration { var: &'static str, reason: String },

    /// Anything the wallet provider or the RPC node rejected or failed on.
    #[error("{service} error: {message}")]
    ExternalService { service: Service, message: String },
}

impl QuickstartError {
    fn missing(var: &'static str) -> Self {
        QuickstartError::Configuration {
            var,
            reason: "is missing; set it in your .env file".into(),
        }
    }

    fn invalid(var: &'static str, reason: impl fmt::Display) -> Self {
        QuickstartError::Configuration {
            var,
            reason: format!("is invalid: {reason}"),
        }
    }

    fn wallet_api(message: impl Into<String>) -> Self {
        QuickstartError::ExternalService {
            service: Service::WalletProvider,
            message: message.into(),
        }
    }

    fn rpc(message: impl Into<String>) -> Self {
        QuickstartError::ExternalService {
            service: Service::SolanaRpc,
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, QuickstartError::Configuration { .. })
    }
}

// ─────────────────── Configuration ───────────────────

pub const API_KEY_VAR: &str = "CROSSMINT_API_KEY";
pub const RECIPIENT_VAR: &str = "RECIPIENT_ADDRESS";
pub const BASE_URL_VAR: &str = "CROSSMINT_BASE_URL";
pub const RPC_URL_VAR: &str = "RPC_URL";
pub const TOKEN_VAR: &str = "TRANSFER_TOKEN";
pub const AMOUNT_VAR: &str = "TRANSFER_AMOUNT";
pub const POLL_INTERVAL_VAR: &str = "POLL_INTERVAL_MS";
pub const SEND_TIMEOUT_VAR: &str = "SEND_TIMEOUT_SECS";

const STAGING_URL: &str = "https://staging.crossmint.com";
const PRODUCTION_URL: &str = "https://www.crossmint.com";
const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
const DEFAULT_AMOUNT: &str = "0.001";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Server API key. The provider holds the wallet's signing key and acts on
/// whoever presents this token, so it is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0.starts_with("sk_production_") || self.0.starts_with("ck_production_")
    }

    fn default_base_url(&self) -> &'static str {
        if self.is_production() {
            PRODUCTION_URL
        } else {
            STAGING_URL
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Token to transfer: the chain's native coin or an SPL mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Native,
    Mint(Pubkey),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Native => "SOL".to_string(),
            Token::Mint(mint) => format!("of token {mint}"),
        }
    }
}

impl FromStr for Token {
    type Err = ParsePubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("sol") {
            Ok(Token::Native)
        } else {
            Ok(Token::Mint(Pubkey::from_str(s)?))
        }
    }
}

/// Renders the token half of a Crossmint token locator (`solana:<this>`).
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Native => f.write_str("sol"),
            Token::Mint(mint) => write!(f, "{mint}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("expected a decimal number such as 0.001, got {0:?}")]
    Malformed(String),
    #[error("amount must be greater than zero")]
    Zero,
}

/// Positive decimal amount. Kept as the original string so no precision is
/// lost on the way to the provider; serializes as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        let well_formed = match s.split_once('.') {
            Some((whole, frac)) => {
                !whole.is_empty() && !frac.is_empty() && all_digits(whole) && all_digits(frac)
            }
            None => !s.is_empty() && all_digits(s),
        };
        if !well_formed {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if !s.chars().any(|c| matches!(c, '1'..='9')) {
            return Err(AmountError::Zero);
        }
        Ok(Amount(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub recipient: String,
    /// Crossmint origin without trailing slash, e.g. `https://staging.crossmint.com`.
    pub base_url: String,
    pub rpc_url: String,
    pub token: Token,
    pub amount: Amount,
    /// Run the devnet airdrop before sending.
    pub fund_with_airdrop: bool,
    pub poll_interval: Duration,
    pub send_timeout: Duration,
}

impl Config {
    /// Builds the config from any key/value source. Required values are
    /// checked first (API key, then recipient); blank counts as missing.
    pub fn from_lookup<F>(lookup: F, fund_with_airdrop: bool) -> Result<Self, QuickstartError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required =
            |var: &'static str| optional(var).ok_or_else(|| QuickstartError::missing(var));

        let api_key = ApiKey::new(required(API_KEY_VAR)?);
        let recipient = required(RECIPIENT_VAR)?;

        let base_url = optional(BASE_URL_VAR)
            .unwrap_or_else(|| api_key.default_base_url().to_string());
        Url::parse(&base_url).map_err(|e| QuickstartError::invalid(BASE_URL_VAR, e))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        // Only the funding step talks to the RPC node
        let rpc_url = optional(RPC_URL_VAR).unwrap_or_else(|| DEVNET_RPC_URL.to_string());
        if fund_with_airdrop {
            Url::parse(&rpc_url).map_err(|e| QuickstartError::invalid(RPC_URL_VAR, e))?;
        }

        let token = match optional(TOKEN_VAR) {
            Some(t) => t.parse().map_err(|e| QuickstartError::invalid(TOKEN_VAR, e))?,
            None => Token::Native,
        };
        let amount = optional(AMOUNT_VAR)
            .unwrap_or_else(|| DEFAULT_AMOUNT.to_string())
            .parse()
            .map_err(|e| QuickstartError::invalid(AMOUNT_VAR, e))?;

        let poll_interval = match optional(POLL_INTERVAL_VAR) {
            Some(ms) => match ms.parse::<u64>() {
                Ok(0) => {
                    return Err(QuickstartError::invalid(
                        POLL_INTERVAL_VAR,
                        "must be at least 1 millisecond",
                    ))
                }
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => return Err(QuickstartError::invalid(POLL_INTERVAL_VAR, e)),
            },
            None => DEFAULT_POLL_INTERVAL,
        };
        let send_timeout = match optional(SEND_TIMEOUT_VAR) {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .map_err(|e| QuickstartError::invalid(SEND_TIMEOUT_VAR, e))?,
            ),
            None => DEFAULT_SEND_TIMEOUT,
        };

        Ok(Config {
            api_key,
            recipient,
            base_url,
            rpc_url,
            token,
            amount,
            fund_with_airdrop,
            poll_interval,
            send_timeout,
        })
    }
}

/// Reads `.env` if present, then the process environment.
pub fn load_config(fund_with_airdrop: bool) -> Result<Config, QuickstartError> {
    dotenv().ok();
    Config::from_lookup(|var| env::var(var).ok(), fund_with_airdrop)
}

/// Diagnostics go to stderr so they never interleave with the console lines
/// on stdout. `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;
    Ok(())
}

// ─────────────────── Records ───────────────────

/// Signer the provider should attach to a new wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignerDescriptor {
    /// The provider custodies the key and signs for requests bearing our API key.
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWallet {
    pub chain: String,
    pub signer: SignerDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Wallet {
    #[serde(rename = "chainType", alias = "chain")]
    pub chain: String,
    pub address: String,
}

/// Body of a transfer; the token travels in the URL as a locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub recipient: String,
    #[serde(skip)]
    pub token: Token,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub hash: Option<String>,
    pub explorer_link: Option<String>,
}

/// Recent blockhash plus the last block height at which transactions
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub wallet: Wallet,
    pub airdrop: Option<Signature>,
    pub transaction: Transaction,
}

// ─────────────────── External services ───────────────────

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn create_wallet(
        &self,
        api_key: &ApiKey,
        request: &CreateWallet,
    ) -> Result<Wallet, QuickstartError>;

    async fn send(
        &self,
        api_key: &ApiKey,
        wallet: &Wallet,
        transfer: &Transfer,
    ) -> Result<Transaction, QuickstartError>;
}

#[async_trait]
pub trait FundingNetwork: Send + Sync {
    async fn request_airdrop(&self, address: &str, lamports: u64)
        -> Result<Signature, QuickstartError>;

    async fn latest_checkpoint(&self) -> Result<Checkpoint, QuickstartError>;

    /// Blocks until `signature` is confirmed or the checkpoint's height bound passes.
    async fn confirm(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), QuickstartError>;
}

// ─────────────────── Crossmint wallets API ───────────────────

const API_VERSION: &str = "2025-06-09";

pub fn http_client() -> Result<Client, QuickstartError> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| QuickstartError::wallet_api(format!("failed to build HTTP client: {e}")))
}

trait CrossmintReqExt {
    fn with_api_key(self, key: &ApiKey) -> Self;
}

impl CrossmintReqExt for reqwest::RequestBuilder {
    fn with_api_key(self, key: &ApiKey) -> Self {
        self.header("x-api-key", key.expose())
    }
}

#[derive(Deserialize, Debug)]
struct TransactionResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "onChain")]
    on_chain: Option<OnChain>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug, Default)]
struct OnChain {
    #[serde(default, rename = "txId", alias = "hash")]
    tx_id: Option<String>,
    #[serde(default, rename = "explorerLink")]
    explorer_link: Option<String>,
}

enum Progress {
    Settled,
    Failed(String),
    Pending,
}

impl TransactionResponse {
    fn progress(&self) -> Progress {
        let has_hash = self
            .on_chain
            .as_ref()
            .and_then(|c| c.tx_id.as_ref())
            .is_some();
        match self.status.as_deref() {
            Some("failed") => Progress::Failed(
                self.error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no error details".into()),
            ),
            Some("success") => Progress::Settled,
            None if has_hash => Progress::Settled,
            _ => Progress::Pending,
        }
    }

    fn into_transaction(self) -> Transaction {
        let on_chain = self.on_chain.unwrap_or_default();
        Transaction {
            id: self.id,
            hash: on_chain.tx_id,
            explorer_link: on_chain.explorer_link,
        }
    }
}

fn transport_error(e: reqwest::Error) -> QuickstartError {
    QuickstartError::wallet_api(format!("request failed: {e}"))
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, QuickstartError> {
    let status = resp.status();
    if !status.is_success() {
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => format!("<body unreadable: {e}>"),
        };
        return Err(QuickstartError::wallet_api(format!("HTTP {status}: {body}")));
    }
    resp.json()
        .await
        .map_err(|e| QuickstartError::wallet_api(format!("unexpected response body: {e}")))
}

/// REST client for Crossmint's custodial wallets.
#[derive(Debug, Clone)]
pub struct CrossmintClient {
    http: Client,
    base_url: String,
    poll_interval: Duration,
    send_timeout: Duration,
}

impl CrossmintClient {
    pub fn new(cfg: &Config) -> Result<Self, QuickstartError> {
        Ok(CrossmintClient {
            http: http_client()?,
            base_url: cfg.base_url.clone(),
            poll_interval: cfg.poll_interval,
            send_timeout: cfg.send_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, API_VERSION, path)
    }

    /// Transfers can come back before they land; poll until the provider
    /// reports a terminal state or `send_timeout` runs out.
    async fn settle(
        &self,
        api_key: &ApiKey,
        wallet: &Wallet,
        mut tx: TransactionResponse,
    ) -> Result<Transaction, QuickstartError> {
        let deadline = Instant::now() + self.send_timeout;
        loop {
            match tx.progress() {
                Progress::Settled => return Ok(tx.into_transaction()),
                Progress::Failed(reason) => {
                    return Err(QuickstartError::wallet_api(format!(
                        "transaction {} failed: {reason}",
                        tx.id
                    )))
                }
                Progress::Pending if Instant::now() >= deadline => {
                    return Err(QuickstartError::wallet_api(format!(
                        "transaction {} still pending after {}s",
                        tx.id,
                        self.send_timeout.as_secs()
                    )))
                }
                Progress::Pending => {}
            }

            sleep(self.poll_interval).await;
            let path = format!("wallets/{}/transactions/{}", wallet.address, tx.id);
            let resp = self
                .http
                .get(self.endpoint(&path))
                .with_api_key(api_key)
                .send()
                .await
                .map_err(transport_error)?;
            tx = read_json(resp).await?;
            debug!(id = %tx.id, status = ?tx.status, "polled transaction");
        }
    }
}

#[async_trait]
impl WalletProvider for CrossmintClient {
    async fn create_wallet(
        &self,
        api_key: &ApiKey,
        request: &CreateWallet,
    ) -> Result<Wallet, QuickstartError> {
        let body = json!({
            "chainType": request.chain,
            "type": "smart",
            "config": { "adminSigner": request.signer },
        });
        debug!(chain = %request.chain, "creating wallet");
        let resp = self
            .http
            .post(self.endpoint("wallets"))
            .with_api_key(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(resp).await
    }

    async fn send(
        &self,
        api_key: &ApiKey,
        wallet: &Wallet,
        transfer: &Transfer,
    ) -> Result<Transaction, QuickstartError> {
        let path = format!(
            "wallets/{}/tokens/{}:{}/transfers",
            wallet.address, wallet.chain, transfer.token
        );
        let resp = self
            .http
            .post(self.endpoint(&path))
            .with_api_key(api_key)
            .json(transfer)
            .send()
            .await
            .map_err(transport_error)?;
        let tx: TransactionResponse = read_json(resp).await?;
        debug!(id = %tx.id, status = ?tx.status, "transfer submitted");
        self.settle(api_key, wallet, tx).await
    }
}

// ─────────────────── Devnet airdrop (Solana RPC) ───────────────────

fn rpc_error(e: ClientError) -> QuickstartError {
    QuickstartError::rpc(e.to_string())
}

/// Faucet-backed funding over the public Solana RPC, at `confirmed` commitment.
pub struct DevnetFaucet {
    rpc: RpcClient,
    poll_interval: Duration,
}

impl DevnetFaucet {
    pub fn new(cfg: &Config) -> Self {
        DevnetFaucet {
            rpc: RpcClient::new_with_commitment(cfg.rpc_url.clone(), CommitmentConfig::confirmed()),
            poll_interval: cfg.poll_interval,
        }
    }
}

#[async_trait]
impl FundingNetwork for DevnetFaucet {
    async fn request_airdrop(
        &self,
        address: &str,
        lamports: u64,
    ) -> Result<Signature, QuickstartError> {
        let pubkey = Pubkey::from_str(address).map_err(|e| {
            QuickstartError::rpc(format!("wallet address {address} is not a Solana public key: {e}"))
        })?;
        self.rpc
            .request_airdrop(&pubkey, lamports)
            .await
            .map_err(rpc_error)
    }

    async fn latest_checkpoint(&self) -> Result<Checkpoint, QuickstartError> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.rpc.commitment())
            .await
            .map_err(rpc_error)?;
        Ok(Checkpoint {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn confirm(
        &self,
        signature: &Signature,
        checkpoint: &Checkpoint,
    ) -> Result<(), QuickstartError> {
        loop {
            let statuses = self
                .rpc
                .get_signature_statuses(&[*signature])
                .await
                .map_err(rpc_error)?
                .value;
            if let Some(status) = statuses.into_iter().flatten().next() {
                if let Some(err) = &status.err {
                    return Err(QuickstartError::rpc(format!(
                        "airdrop {signature} failed: {err}"
                    )));
                }
                if status.satisfies_commitment(self.rpc.commitment()) {
                    return Ok(());
                }
            }

            let height = self.rpc.get_block_height().await.map_err(rpc_error)?;
            if height > checkpoint.last_valid_block_height {
                return Err(QuickstartError::rpc(format!(
                    "airdrop {signature} not confirmed before block height {} (now at {height})",
                    checkpoint.last_valid_block_height
                )));
            }
            sleep(self.poll_interval).await;
        }
    }
}

// ─────────────────── Quickstart Flow (create → [airdrop] → send) ───────────────────

fn say<W: Write>(out: &mut W, line: fmt::Arguments<'_>) {
    if let Err(err) = writeln!(out, "{line}") {
        debug!(%err, "console write failed");
    }
}

/// Requests one SOL from the faucet and waits for it to confirm.
pub async fn fund_wallet_with_airdrop<N, W>(
    network: &N,
    address: &str,
    out: &mut W,
) -> Result<Signature, QuickstartError>
where
    N: FundingNetwork + ?Sized,
    W: Write,
{
    say(out, format_args!("{PREFIX} 💧 Requesting airdrop of 1 SOL to {address}..."));
    let signature = network.request_airdrop(address, LAMPORTS_PER_SOL).await?;

    say(out, format_args!("{PREFIX} ⏳ Waiting for airdrop transaction to be confirmed..."));
    say(out, format_args!("   - Airdrop Signature: {signature}"));

    let checkpoint = network.latest_checkpoint().await?;
    debug!(
        blockhash = %checkpoint.blockhash,
        last_valid_block_height = checkpoint.last_valid_block_height,
        "confirming airdrop"
    );
    network.confirm(&signature, &checkpoint).await?;

    say(out, format_args!("{PREFIX} ✅ Airdrop confirmed!"));
    Ok(signature)
}

pub async fn quickstart_flow<P, N, W>(
    cfg: &Config,
    wallets: &P,
    network: &N,
    out: &mut W,
) -> Result<Receipt, QuickstartError>
where
    P: WalletProvider + ?Sized,
    N: FundingNetwork + ?Sized,
    W: Write,
{
    say(out, format_args!("{PREFIX} 🚀 Starting wallet creation..."));

    // 1. Custodial wallet; the provider keeps the key
    let request = CreateWallet {
        chain: SOLANA_CHAIN.to_string(),
        signer: SignerDescriptor::ApiKey,
    };
    let wallet = wallets.create_wallet(&cfg.api_key, &request).await?;

    say(out, format_args!("{PREFIX} ✅ Wallet created successfully!"));
    say(out, format_args!("   - Chain: {}", wallet.chain));
    say(out, format_args!("   - Address: {}", wallet.address));

    // 2. Devnet fee money
    let airdrop = if cfg.fund_with_airdrop {
        Some(fund_wallet_with_airdrop(network, &wallet.address, out).await?)
    } else {
        None
    };

    // 3. Transfer
    let transfer = Transfer {
        recipient: cfg.recipient.clone(),
        token: cfg.token.clone(),
        amount: cfg.amount.clone(),
    };
    let short: String = transfer.recipient.chars().take(6).collect();
    say(
        out,
        format_args!(
            "{PREFIX} 💸 Sending {} {} to {short}...",
            transfer.amount,
            transfer.token.describe()
        ),
    );
    let transaction = wallets.send(&cfg.api_key, &wallet, &transfer).await?;

    say(out, format_args!("{PREFIX} ✅ Transaction sent successfully!"));
    say(out, format_args!("   - Transaction ID: {}", transaction.id));
    if let Some(hash) = &transaction.hash {
        say(out, format_args!("   - Transaction Hash: {hash}"));
    }
    if let Some(link) = &transaction.explorer_link {
        say(out, format_args!("   - View on Explorer: {link}"));
    }

    Ok(Receipt {
        wallet,
        airdrop,
        transaction,
    })
}

/// The single error boundary: every failure ends up here exactly once.
/// `err_out` is the operator's error stream (stderr for the binaries).
pub fn report_failure<E: Write>(err: &QuickstartError, err_out: &mut E) {
    error!(error = %err, "quickstart failed");
    say(err_out, format_args!("{PREFIX} ❌ An error occurred: {err}"));
}

async fn connect_and_run<P, N, W, F>(
    config: Result<Config, QuickstartError>,
    connect: F,
    out: &mut W,
) -> Result<Receipt, QuickstartError>
where
    P: WalletProvider,
    N: FundingNetwork,
    W: Write,
    F: FnOnce(&Config) -> Result<(P, N), QuickstartError>,
{
    let cfg = config?;
    let (wallets, network) = connect(&cfg)?;
    quickstart_flow(&cfg, &wallets, &network, out).await
}

/// Runs the flow behind the error boundary. `connect` is only called once
/// the config is valid, so a bad config never touches the network.
/// Progress goes to `out`, the failure line to `err_out`.
pub async fn run_quickstart<P, N, W, E, F>(
    config: Result<Config, QuickstartError>,
    connect: F,
    out: &mut W,
    err_out: &mut E,
) -> Result<Receipt, QuickstartError>
where
    P: WalletProvider,
    N: FundingNetwork,
    W: Write,
    E: Write,
    F: FnOnce(&Config) -> Result<(P, N), QuickstartError>,
{
    let outcome = connect_and_run(config, connect, out).await;
    if let Err(err) = &outcome {
        report_failure(err, err_out);
    }
    outcome
}

pub fn connect(cfg: &Config) -> Result<(CrossmintClient, DevnetFaucet), QuickstartError> {
    Ok((CrossmintClient::new(cfg)?, DevnetFaucet::new(cfg)))
}

/// Loads `.env`, talks to Crossmint and (optionally) devnet. Progress is
/// printed to stdout, a failure to stderr.
pub async fn quickstart(fund_with_airdrop: bool) -> Result<Receipt, QuickstartError> {
    run_quickstart(
        load_config(fund_with_airdrop),
        connect,
        &mut io::stdout(),
        &mut io::stderr(),
    )
    .await
}
