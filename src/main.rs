// ABOUTME: Entry point for the sortie CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use sortie::config::Config;
use sortie::error::Result;
use sortie::orchestrator::{AwsSession, EcsClient};
use sortie::output::Output;
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = cli.output_mode();

    if let Err(e) = run(cli).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(cli.output_mode());

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover_or_default(&env::current_dir()?)?,
    };

    let target = cli.command.target();
    let (cluster, service) = config.target(target.cluster.clone(), target.service.clone())?;
    let client = connect(&cli, &config).await?;

    match cli.command {
        Commands::Deploy {
            tag,
            timeout,
            interval,
            no_wait,
            ..
        } => {
            let mut policy = config.rollout.clone();
            if let Some(secs) = timeout {
                policy.timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = interval {
                policy.interval = Duration::from_secs(secs);
            }

            let policy = (!no_wait).then_some(policy);
            commands::deploy(&client, cluster, service, &tag, policy, output).await
        }
        Commands::Current { .. } => commands::current(&client, cluster, service, &output).await,
        Commands::Check { .. } => commands::check(&client, cluster, service, &output).await,
        Commands::Run { command, .. } => {
            let command = config.command(&command)?;
            commands::run_task(&client, cluster, service, &command, &output).await
        }
    }
}

/// Build the orchestrator client, loading the AWS session only when the
/// endpoint or the signer needs it.
async fn connect(cli: &Cli, config: &Config) -> Result<EcsClient> {
    let signing = config.signing && !cli.no_sign;
    let explicit = config.explicit_endpoint(cli.endpoint.as_deref());

    let session = if signing || explicit.is_none() {
        let profile = cli.profile.as_deref().or(config.profile.as_deref());
        let region = cli.region.as_deref().or(config.region.as_deref());
        Some(AwsSession::load(profile, region).await)
    } else {
        None
    };

    let region = session.as_ref().and_then(AwsSession::region);
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref(), region)?;
    let client = EcsClient::new(&endpoint, config.request_timeout)?;

    match session {
        Some(session) if signing => Ok(client.with_signer(session.signer()?)),
        _ => Ok(client),
    }
}
