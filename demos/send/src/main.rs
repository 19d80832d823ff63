// demos/send/src/main.rs

use common::{init_tracing, quickstart};
use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing()?;

    // Create the wallet and send from it; the wallet must already hold funds
    match quickstart(false).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
