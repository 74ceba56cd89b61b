use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = cli::Cli::parse();

    // Run status of the failing environment becomes the process exit code
    let code = parsed.dispatch().await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
