use anyhow::Result;
use clap::Parser;
use pathway_ai::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    pathway_ai::run(args).await
}
