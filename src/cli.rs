//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use cattlectl_core::ConfigOverrides;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// cattlectl - declarative apply for Rancher
#[derive(Parser, Debug)]
#[command(name = "cattlectl")]
#[command(version)]
#[command(about = "Converge Rancher clusters, projects and workloads to YAML descriptors")]
#[command(
    long_about = "cattlectl reads descriptor documents and creates or upgrades the Rancher resources they declare. Resources that already match are left untouched."
)]
pub struct Cli {
    /// Log filter, e.g. `info` or `cattlectl_client=debug`. Falls back to RUST_LOG.
    #[arg(long, global = true, env = "CATTLECTL_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a descriptor stream
    Apply(ApplyArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Descriptor file, or `-` for standard input
    #[arg(short, long)]
    pub file: PathBuf,

    /// Report changes without writing them
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, env = "CATTLECTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rancher endpoint URL
    #[arg(long, env = "CATTLECTL_RANCHER_URL")]
    pub url: Option<String>,

    /// API access key
    #[arg(long, env = "CATTLECTL_RANCHER_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// API secret key
    #[arg(long, env = "CATTLECTL_RANCHER_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Bearer token; derived from the key pair when absent
    #[arg(long, env = "CATTLECTL_RANCHER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Default cluster name
    #[arg(long, env = "CATTLECTL_RANCHER_CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    /// Default cluster id
    #[arg(long, env = "CATTLECTL_RANCHER_CLUSTER_ID")]
    pub cluster_id: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, default_value_t = false)]
    pub insecure_api: bool,

    /// Overlay desired app answers onto the deployed ones
    #[arg(long, default_value_t = false)]
    pub merge_answers: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl ApplyArgs {
    /// Command line layer of the configuration. Switches that were not given
    /// leave the lower layers in place.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            token: self.token.clone(),
            cluster_name: self.cluster_name.clone(),
            cluster_id: self.cluster_id.clone(),
            insecure_api: self.insecure_api.then_some(true),
            merge_answers: self.merge_answers.then_some(true),
            dry_run: self.dry_run.then_some(true),
        }
    }

    /// Whether the descriptor stream comes from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}
