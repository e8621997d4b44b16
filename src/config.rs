//! Configuration loading and validation.
//!
//! Every section is `#[serde(default)]`, so an empty or missing file is
//! valid. Precedence: env vars > config file > defaults. The resulting
//! [`Config`] is built once at startup and passed by reference to every
//! kernel policy query.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "KERNVER_CONFIG";

/// Config file used when neither `--config` nor [`CONFIG_PATH_ENV`] is set.
pub const DEFAULT_CONFIG_FILE: &str = "kernver.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kernel version sources.
    pub kernel: KernelConfig,
    /// Program tier force flags.
    pub programs: ProgramsConfig,
    /// Fixed answers for kernel capability probes.
    pub probes: ProbesConfig,
    /// Log filtering.
    pub logging: LoggingConfig,
}

/// Where the running kernel version is read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Explicit version override. Empty means unset.
    pub version: Option<String>,
    /// Root of the proc filesystem holding `version_signature`.
    pub procfs: PathBuf,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            version: None,
            procfs: PathBuf::from("/proc"),
        }
    }
}

/// Flags that bypass capability-based program tier decisions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgramsConfig {
    /// Never load large or v6.1 programs. Wins over `force_large`.
    pub force_small: bool,
    /// Load large programs without probing.
    pub force_large: bool,
}

/// Capability probe answers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    /// Kernel accepts programs over the historical instruction limit.
    pub large_program_size: bool,
    /// Signal-sending helper is available.
    pub signal_helper: bool,
}

/// Log filtering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Parse a TOML string, without env overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Validate that configuration values are usable.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.kernel.procfs.as_os_str().is_empty(),
            "kernel.procfs must not be empty"
        );
        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("invalid logging.level: {}", self.logging.level))?;
        if self.programs.force_small && self.programs.force_large {
            tracing::warn!("both force_small and force_large set, force_small takes precedence");
        }
        Ok(())
    }

    /// The version override, if set to a non-empty value.
    pub fn version_override(&self) -> Option<&str> {
        self.kernel.version.as_deref().filter(|v| !v.is_empty())
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("KERNVER_KERNEL_VERSION") {
            self.kernel.version = Some(v);
        }
        if let Some(v) = env("KERNVER_PROCFS") {
            self.kernel.procfs = PathBuf::from(v);
        }
        override_bool(&env, "KERNVER_FORCE_SMALL_PROGS", &mut self.programs.force_small);
        override_bool(&env, "KERNVER_FORCE_LARGE_PROGS", &mut self.programs.force_large);
    }
}

fn override_bool(env: &impl Fn(&str) -> Option<String>, var: &'static str, slot: &mut bool) {
    let Some(v) = env(var) else {
        return;
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => *slot = true,
        "0" | "false" | "no" | "off" => *slot = false,
        _ => tracing::warn!(var, value = %v, "ignoring invalid env override"),
    }
}

/// Resolve the config file path from an explicit flag and the environment.
///
/// `explicit` wins, then [`CONFIG_PATH_ENV`], then [`DEFAULT_CONFIG_FILE`].
pub fn config_path_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    env(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a TOML file.
///
/// A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!(path = %path.display(), "loading config from file");
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to read config at {}", path.display()))
        }
    }
}

/// Load, apply env overrides and validate, the way the binary does at startup.
///
/// # Errors
///
/// Returns an error if loading or validation fails.
pub fn load_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let mut config = load_config(path)?;
    config.apply_overrides(env);
    config.validate()?;
    Ok(config)
}
