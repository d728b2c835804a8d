// ABOUTME: Configuration types and parsing for sortie.yml.
// ABOUTME: Handles file discovery, endpoint resolution, defaults, and command shortcuts.

mod command;

pub use command::{CommandShortcut, split_command_line};

use crate::deploy::PollPolicy;
use crate::error::{Error, Result};
use crate::orchestrator::regional_endpoint;
use crate::types::{ClusterRef, ServiceRef};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "sortie.yml";
pub const CONFIG_FILENAME_ALT: &str = "sortie.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".sortie/config.yml";

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "SORTIE_ENDPOINT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Orchestrator endpoint, e.g. `http://localhost:4566`. Defaults to the
    /// public endpoint of `region`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// AWS profile for credentials and region (default: `AWS_PROFILE` or `default`).
    #[serde(default)]
    pub profile: Option<String>,

    /// AWS region, overriding the profile and environment.
    #[serde(default)]
    pub region: Option<String>,

    /// Sign requests with SigV4. Turn off for emulators that reject signatures.
    #[serde(default = "default_signing")]
    pub signing: bool,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Cluster used when `--cluster` is not given.
    #[serde(default)]
    pub cluster: Option<String>,

    /// Service used when `--service` is not given.
    #[serde(default)]
    pub service: Option<String>,

    #[serde(default)]
    pub rollout: PollPolicy,

    #[serde(default)]
    pub commands: HashMap<String, CommandShortcut>,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_signing() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: None,
            profile: None,
            region: None,
            signing: default_signing(),
            request_timeout: default_request_timeout(),
            cluster: None,
            service: None,
            rollout: PollPolicy::default(),
            commands: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`discover`](Self::discover), but a missing file yields defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.rollout.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "rollout.interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint from the flag, then `SORTIE_ENDPOINT`, then the file.
    pub fn explicit_endpoint(&self, flag: Option<&str>) -> Option<String> {
        if let Some(endpoint) = flag {
            return Some(endpoint.to_string());
        }
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV)
            && !endpoint.is_empty()
        {
            return Some(endpoint);
        }
        self.endpoint.clone()
    }

    /// [`explicit_endpoint`](Self::explicit_endpoint), falling back to the
    /// public endpoint of `region`.
    pub fn resolve_endpoint(&self, flag: Option<&str>, region: Option<&str>) -> Result<String> {
        self.explicit_endpoint(flag)
            .or_else(|| region.map(regional_endpoint))
            .ok_or(Error::MissingEndpoint)
    }

    /// Cluster and service from flags, falling back to configured defaults.
    pub fn target(
        &self,
        cluster: Option<String>,
        service: Option<String>,
    ) -> Result<(ClusterRef, ServiceRef)> {
        let cluster = cluster
            .or_else(|| self.cluster.clone())
            .ok_or(Error::MissingTarget("cluster"))?;
        let service = service
            .or_else(|| self.service.clone())
            .ok_or(Error::MissingTarget("service"))?;

        Ok((ClusterRef::named(cluster), ServiceRef::named(service)))
    }

    /// Resolve a shortcut name, or treat the input as a literal command line.
    pub fn command(&self, name_or_line: &str) -> Result<Vec<String>> {
        let args = match self.commands.get(name_or_line) {
            Some(shortcut) => {
                tracing::debug!(shortcut = name_or_line, "using configured command");
                shortcut.to_args()
            }
            None => split_command_line(name_or_line),
        };

        if args.is_empty() {
            return Err(Error::EmptyCommand(name_or_line.to_string()));
        }
        Ok(args)
    }
}
