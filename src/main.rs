use absconditus::cli::{Cli, CliHandler};
use absconditus::{ClientConfig, VaultClient, VaultSession};
use anyhow::Result;
use clap::Parser;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ClientConfig::load()?;
    cli.apply_to(&mut config);
    tracing::debug!(server = %config.server_url, timeout_ms = config.timeout_ms, "configuration loaded");

    let client = VaultClient::from_config(&config)?;
    let session = VaultSession::new(client);

    let mut handler = CliHandler::new(config, session);
    handler.run(cli.command).await
}
