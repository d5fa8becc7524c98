use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use beyond2c_admin::cli::{Cli, Console};
use beyond2c_admin::config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let directive = if cli.debug { "beyond2c_admin=debug" } else { "beyond2c_admin=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Beyond 2°C admin console v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load(cli.config.as_deref())?;
    let mut console = Console::open(&cfg).await?;

    let mut stdout = std::io::stdout();
    let ok = console.execute(cli.command, &mut stdout).await?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
