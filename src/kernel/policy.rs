//! Version comparisons and program-tier eligibility.
//!
//! Every query re-resolves the running kernel through [`discover`] and reads
//! the configuration passed in at construction; nothing is cached. Force
//! flags are evaluated top to bottom: force-small beats force-large, and both
//! beat probed capabilities.

use tracing::{debug, warn};

use super::discovery::{discover, KernelIdentity, SystemIdentity, Uname};
use super::{codec, KernelVersion};
use crate::config::{Config, ProbesConfig};

/// First kernel release the v6.1 program tier is built for.
pub const V61_MIN_VERSION: &str = "6.1.0";

/// Kernel capability answers consumed by the large-program decision.
pub trait CapabilityProbe {
    /// The kernel accepts programs beyond the historical instruction limit.
    fn has_program_large_size(&self) -> bool;

    /// The signal-sending helper is available to programs.
    fn has_signal_helper(&self) -> bool;
}

/// [`CapabilityProbe`] returning fixed answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticProbes {
    /// Answer for [`CapabilityProbe::has_program_large_size`].
    pub large_program_size: bool,
    /// Answer for [`CapabilityProbe::has_signal_helper`].
    pub signal_helper: bool,
}

impl From<&ProbesConfig> for StaticProbes {
    fn from(cfg: &ProbesConfig) -> Self {
        Self {
            large_program_size: cfg.large_program_size,
            signal_helper: cfg.signal_helper,
        }
    }
}

impl CapabilityProbe for StaticProbes {
    fn has_program_large_size(&self) -> bool {
        self.large_program_size
    }

    fn has_signal_helper(&self) -> bool {
        self.signal_helper
    }
}

impl<P: CapabilityProbe + ?Sized> CapabilityProbe for &P {
    fn has_program_large_size(&self) -> bool {
        (**self).has_program_large_size()
    }

    fn has_signal_helper(&self) -> bool {
        (**self).has_signal_helper()
    }
}

/// Answers version and eligibility questions about the running kernel.
#[derive(Debug)]
pub struct KernelPolicy<'a, I = Uname, P = StaticProbes> {
    config: &'a Config,
    identity: I,
    probes: P,
}

impl<'a> KernelPolicy<'a> {
    /// Policy backed by `uname(2)` and the probe answers in `config`.
    pub fn new(config: &'a Config) -> Self {
        Self::with_seams(config, Uname, StaticProbes::from(&config.probes))
    }
}

impl<'a, I: SystemIdentity, P: CapabilityProbe> KernelPolicy<'a, I, P> {
    /// Policy with explicit identity and probe implementations.
    pub fn with_seams(config: &'a Config, identity: I, probes: P) -> Self {
        Self {
            config,
            identity,
            probes,
        }
    }

    /// The configuration this policy reads.
    pub fn config(&self) -> &Config {
        self.config
    }

    /// Resolve the running kernel from the configured sources.
    pub fn identity(&self) -> KernelIdentity {
        discover(
            self.config.version_override(),
            &self.config.kernel.procfs,
            &self.identity,
        )
    }

    /// Quirk-corrected running version used for every comparison.
    pub fn running_version(&self) -> KernelVersion {
        self.identity().corrected()
    }

    /// `true` if the running kernel is at or above `threshold`.
    pub fn is_at_least(&self, threshold: &str) -> bool {
        self.running_version() >= codec::encode(threshold)
    }

    /// `true` if the running kernel is strictly below `threshold`.
    pub fn is_less_than(&self, threshold: &str) -> bool {
        self.running_version() < codec::encode(threshold)
    }

    /// Preflight check of the live uname release against `threshold`.
    ///
    /// Ignores the override and signature file on purpose. Passes when uname
    /// cannot be read, so an identification failure never blocks startup.
    pub fn minimum_version_satisfied(&self, threshold: &str) -> bool {
        let release = match self.identity.release() {
            Ok(release) => release,
            Err(e) => {
                warn!(error = %e, "uname unavailable, skipping minimum kernel check");
                return true;
            }
        };
        let running = codec::encode(&release);
        let minimum = codec::encode(threshold);
        debug!(release = %release, %running, %minimum, "minimum kernel check");
        running >= minimum
    }

    /// Whether the large-program (v5.3) tier may be loaded.
    pub fn large_programs_eligible(&self) -> bool {
        let programs = &self.config.programs;
        if programs.force_small {
            return false;
        }
        if programs.force_large {
            return true;
        }
        let large_size = self.probes.has_program_large_size();
        let signal_helper = self.probes.has_signal_helper();
        debug!(large_size, signal_helper, "probed large-program support");
        large_size && signal_helper
    }

    /// Whether the v6.1 tier may be loaded.
    pub fn v61_programs_eligible(&self) -> bool {
        if self.config.programs.force_small {
            return false;
        }
        self.is_at_least(V61_MIN_VERSION)
    }
}
