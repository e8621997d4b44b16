//! kernver CLI entry point.
//!
//! Provides `version`, `check`, and `select` subcommands for inspecting the
//! resolved kernel version, running the minimum-version preflight, and
//! printing the kprobe objects an agent would load.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use kernver::config::{config_path_with, load_with_env, Config, LoggingConfig};
use kernver::kernel::{
    select_kprobe_variant, KernelIdentity, KernelPolicy, KernelVersion, KprobeObjects,
    ProgramVariant,
};
use kernver::logging;

/// kernver — kernel version discovery for instrumentation agents.
#[derive(Parser)]
#[command(name = "kernver", version, about)]
struct Cli {
    /// Config file (default: `$KERNVER_CONFIG` or `./kernver.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs, rotated daily, under this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Show the resolved kernel version and where it came from.
    Version {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Fail unless the live kernel release is at least MIN.
    Check {
        /// Minimum kernel version, e.g. `4.19` or `5.3.0`.
        min: String,
    },
    /// Show which generic kprobe objects would be loaded.
    Select {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// `version` output.
#[derive(Serialize)]
struct VersionReport {
    #[serde(flatten)]
    identity: KernelIdentity,
    corrected: KernelVersion,
}

/// `select` output.
#[derive(Serialize)]
struct SelectReport {
    variant: ProgramVariant,
    objects: KprobeObjects,
    v61_eligible: bool,
    large_eligible: bool,
    running: KernelVersion,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Install logging before loading config so override and validation
    // warnings are emitted; the configured level is applied afterwards.
    let bootstrap_level = LoggingConfig::default().level;
    let log_guard = match &cli.log_dir {
        Some(dir) => logging::init_production(dir, &bootstrap_level)?,
        None => logging::init_cli(&bootstrap_level)?,
    };

    let path = config_path_with(cli.config.as_deref(), |key| std::env::var(key).ok());
    let config = load_with_env(&path, |key| std::env::var(key).ok())
        .with_context(|| format!("failed to load {}", path.display()))?;
    log_guard.set_default_level(&config.logging.level)?;

    match cli.command {
        Command::Version { json } => handle_version(&config, json),
        Command::Check { min } => handle_check(&config, &min),
        Command::Select { json } => handle_select(&config, json),
    }
}

/// Print the resolved kernel identity.
fn handle_version(config: &Config, json: bool) -> anyhow::Result<()> {
    let policy = KernelPolicy::new(config);
    let identity = policy.identity();
    let report = VersionReport {
        corrected: identity.corrected(),
        identity,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} (source: {}, code: {:#08x}, corrected: {:#08x})",
            report.identity.display,
            report.identity.source.as_str(),
            report.identity.version.code(),
            report.corrected.code(),
        );
    }
    Ok(())
}

/// Run the minimum kernel version preflight.
fn handle_check(config: &Config, min: &str) -> anyhow::Result<()> {
    let policy = KernelPolicy::new(config);
    anyhow::ensure!(
        policy.minimum_version_satisfied(min),
        "running kernel is older than {min}"
    );
    info!(min, "minimum kernel version satisfied");
    Ok(())
}

/// Print the selected program variant.
fn handle_select(config: &Config, json: bool) -> anyhow::Result<()> {
    let policy = KernelPolicy::new(config);
    let variant = select_kprobe_variant(&policy);
    let report = SelectReport {
        variant,
        objects: variant.objects(),
        v61_eligible: policy.v61_programs_eligible(),
        large_eligible: policy.large_programs_eligible(),
        running: policy.running_version(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("variant: {}", report.variant);
        println!("kprobe:  {}", report.objects.base);
        println!("retprobe: {}", report.objects.ret);
    }
    Ok(())
}
