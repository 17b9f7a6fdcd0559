//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use cattlectl_client::{RancherBackend, RancherClient, RestBackend, TracingBackend};
use cattlectl_core::CattlectlConfig;
use cattlectl_descriptor::{ApiVersionGate, IncludeResolver};
use cattlectl_reconciler::{Applier, ConvergeOutcome};
use tracing::{debug, info};

use crate::cli::{ApplyArgs, Commands};
use crate::report::ApplyReport;

/// Execute a CLI command.
///
/// # Errors
///
/// Returns an error when the run cannot start: bad configuration, an
/// unreadable descriptor file, or an unusable endpoint. Failures while
/// applying are reported and turned into a failing exit code instead.
pub fn execute(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Apply(args) => cmd_apply(&args),
        Commands::Version => {
            cmd_version()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Configuration for `args`: file, then environment, then flags.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be loaded.
pub fn load_config(args: &ApplyArgs) -> Result<CattlectlConfig> {
    let base = match &args.config {
        Some(path) => CattlectlConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => CattlectlConfig::default(),
    };
    Ok(base.apply_env().apply_overrides(args.overrides()))
}

/// Apply the descriptors named by `args` through `root`.
///
/// Includes resolve relative to the descriptor file, or to the working
/// directory when reading standard input.
///
/// # Errors
///
/// Returns an error if the descriptor file cannot be read. Errors while
/// applying are part of the returned outcome.
pub fn apply_descriptors(
    root: RancherClient,
    args: &ApplyArgs,
    dry_run: bool,
) -> Result<ConvergeOutcome> {
    let gate = ApiVersionGate::engine()?;
    let applier = Applier::new(root, gate).with_dry_run(dry_run);

    if args.reads_stdin() {
        debug!("Reading descriptors from stdin");
        return Ok(applier.apply_reader(io::stdin().lock()));
    }

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    debug!(file = %args.file.display(), "Read descriptor file");
    Ok(applier
        .with_includes(IncludeResolver::for_file(gate, &args.file))
        .apply_str(&text))
}

fn cmd_apply(args: &ApplyArgs) -> Result<ExitCode> {
    let config = load_config(args)?;
    let rest =
        RestBackend::new(&config.rancher).context("failed to set up the Rancher API client")?;
    let backend: Arc<dyn RancherBackend> = Arc::new(TracingBackend::new(rest));
    let root = RancherClient::new(&config.rancher, backend);

    info!(file = %args.file.display(), dry_run = config.dry_run, "Applying descriptors");
    let outcome = apply_descriptors(root, args, config.dry_run)?;
    let report = ApplyReport::from_outcome(outcome, config.dry_run);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", report.render(args.output)?.trim_end())?;

    Ok(if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_version() -> Result<()> {
    let gate = ApiVersionGate::engine()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "cattlectl {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(stdout, "descriptor api_version <= {}", gate.supported())?;
    Ok(())
}
