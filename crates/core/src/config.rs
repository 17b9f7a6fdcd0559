//! Run configuration for cattlectl.
//!
//! Values are layered: configuration file < `CATTLECTL_*` environment
//! variables < command line flags. The result is read-only once the root
//! client has been constructed from it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::result::Result;

/// Prefix of every environment variable read by [`CattlectlConfig::apply_env`].
pub const ENV_PREFIX: &str = "CATTLECTL_";

/// Complete configuration of one cattlectl run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CattlectlConfig {
    /// Connection and behaviour settings for the remote API.
    pub rancher: RancherConfig,

    /// Compute and report changes without writing them.
    pub dry_run: bool,
}

/// Connection settings for the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RancherConfig {
    /// Endpoint URL, e.g. `https://rancher.example.com`.
    pub url: Option<String>,

    /// API access key.
    pub access_key: Option<String>,

    /// API secret key.
    pub secret_key: Option<String>,

    /// Bearer token; derived from the key pair when absent.
    pub token: Option<String>,

    /// Cluster used when a descriptor does not name one.
    pub cluster_name: Option<String>,

    /// Cluster id used when neither descriptor nor `cluster_name` name one.
    pub cluster_id: Option<String>,

    /// Skip TLS certificate verification.
    pub insecure_api: bool,

    /// Overlay desired app answers onto the answers already deployed.
    pub merge_answers: bool,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RancherConfig {
    fn default() -> Self {
        Self {
            url: None,
            access_key: None,
            secret_key: None,
            token: None,
            cluster_name: None,
            cluster_id: None,
            insecure_api: false,
            merge_answers: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Values given on the command line. `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub token: Option<String>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub insecure_api: Option<bool>,
    pub merge_answers: Option<bool>,
    pub dry_run: Option<bool>,
}

impl CattlectlConfig {
    /// Load configuration from a file.
    ///
    /// `.yaml` and `.yml` files are parsed as YAML, everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] if the file cannot be read and
    /// [`Error::Config`] if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read(path, e.to_string()))?;

        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");

        let config = if is_yaml {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?
        };

        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Layer the process environment on top of this configuration.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Layer variables from `lookup` on top of this configuration.
    ///
    /// `lookup` receives full variable names such as `CATTLECTL_RANCHER_URL`.
    #[must_use]
    pub fn apply_env_with<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let flag = |name: &str| var(name).map(|v| parse_flag(&v));

        if let Some(url) = var("RANCHER_URL") {
            self.rancher.url = Some(url);
        }
        if let Some(key) = var("RANCHER_ACCESS_KEY") {
            self.rancher.access_key = Some(key);
        }
        if let Some(key) = var("RANCHER_SECRET_KEY") {
            self.rancher.secret_key = Some(key);
        }
        if let Some(token) = var("RANCHER_TOKEN") {
            self.rancher.token = Some(token);
        }
        if let Some(name) = var("RANCHER_CLUSTER_NAME") {
            self.rancher.cluster_name = Some(name);
        }
        if let Some(id) = var("RANCHER_CLUSTER_ID") {
            self.rancher.cluster_id = Some(id);
        }
        if let Some(insecure) = flag("RANCHER_INSECURE_API") {
            self.rancher.insecure_api = insecure;
        }
        if let Some(merge) = flag("RANCHER_MERGE_ANSWERS") {
            self.rancher.merge_answers = merge;
        }
        if let Some(secs) = var("RANCHER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.rancher.timeout_secs = secs;
        }
        if let Some(dry_run) = flag("DRY_RUN") {
            self.dry_run = dry_run;
        }
        self
    }

    /// Layer command line values on top of this configuration.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        let rancher = &mut self.rancher;
        rancher.url = overrides.url.or(rancher.url.take());
        rancher.access_key = overrides.access_key.or(rancher.access_key.take());
        rancher.secret_key = overrides.secret_key.or(rancher.secret_key.take());
        rancher.token = overrides.token.or(rancher.token.take());
        rancher.cluster_name = overrides.cluster_name.or(rancher.cluster_name.take());
        rancher.cluster_id = overrides.cluster_id.or(rancher.cluster_id.take());
        rancher.insecure_api = overrides.insecure_api.unwrap_or(rancher.insecure_api);
        rancher.merge_answers = overrides.merge_answers.unwrap_or(rancher.merge_answers);
        self.dry_run = overrides.dry_run.unwrap_or(self.dry_run);
        self
    }
}

impl RancherConfig {
    /// Bearer token for the remote API.
    ///
    /// An explicit token wins; otherwise it is derived as `access_key:secret_key`.
    pub fn token(&self) -> Option<String> {
        self.token.clone().or_else(|| {
            match (self.access_key.as_deref(), self.secret_key.as_deref()) {
                (Some(access), Some(secret)) => Some(format!("{access}:{secret}")),
                _ => None,
            }
        })
    }

    /// Parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no URL is configured or it does not parse.
    pub fn endpoint(&self) -> Result<Url> {
        let raw = self
            .url
            .as_deref()
            .ok_or_else(|| Error::config("rancher url is not set"))?;
        Url::parse(raw).map_err(|e| Error::config(format!("invalid rancher url '{raw}': {e}")))
    }

    /// Request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
