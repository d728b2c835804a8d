// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use sortie::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sortie")]
#[command(about = "Roll container services onto new image tags and wait for them to run")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: sortie.yml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Orchestrator endpoint, overrides SORTIE_ENDPOINT and the config file
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// AWS profile for credentials and region
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region, also selects the default endpoint
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Send requests unsigned (for local emulators)
    #[arg(long, global = true)]
    pub no_sign: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Which service to act on.
#[derive(Args)]
pub struct Target {
    /// Cluster name or ARN (default: `cluster:` from config)
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Service name or ARN (default: `service:` from config)
    #[arg(short, long)]
    pub service: Option<String>,
}

impl Commands {
    pub fn target(&self) -> &Target {
        match self {
            Commands::Deploy { target, .. }
            | Commands::Current { target }
            | Commands::Check { target }
            | Commands::Run { target, .. } => target,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy an image tag and wait until it is running
    Deploy {
        #[command(flatten)]
        target: Target,

        /// Image tag to deploy
        #[arg(short, long)]
        tag: String,

        /// Seconds to wait for the rollout (default: rollout.timeout from config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Seconds between rollout checks (default: rollout.interval from config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Return as soon as the service has been updated
        #[arg(long)]
        no_wait: bool,
    },

    /// Print the image tag the service currently runs
    Current {
        #[command(flatten)]
        target: Target,
    },

    /// Check once whether the service runs its target specification
    Check {
        #[command(flatten)]
        target: Target,
    },

    /// Run a one-off task from the service's current specification
    Run {
        #[command(flatten)]
        target: Target,

        /// Command shortcut name from config, or a literal command line
        #[arg(short = 'n', long)]
        command: String,
    },
}
