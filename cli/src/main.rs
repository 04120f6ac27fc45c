use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use portal_cli::{commands, Cli, Config, FileTokenStore, UreqTransport};
use portal_core::{ApiClient, Controller, Presenter, Session};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout only carries envelopes.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=info,portal_cli=info,portal_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.overrides()).context("failed to load configuration")?;
    debug!(base_url = %config.base_url, token_file = %config.token_file.display(), "configuration loaded");

    let session = Session::open(FileTokenStore::new(&config.token_file))
        .context("failed to open token store")?;
    let mut controller = Controller::new(
        ApiClient::new(&config.base_url),
        UreqTransport::new(),
        session,
        Presenter::new(std::io::stdout()),
    );

    let ok = commands::run(&mut controller, cli.command, &mut commands::stdin_confirm);
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
