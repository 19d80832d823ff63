// demos/airdrop_send/src/main.rs

use common::{init_tracing, quickstart};
use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing()?;

    // Create the wallet, fund it with a devnet airdrop, then send
    match quickstart(true).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
