//! Generic kprobe program variant selection.

use std::fmt;

use serde::Serialize;

use super::discovery::SystemIdentity;
use super::policy::{CapabilityProbe, KernelPolicy};

/// Compiled program tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramVariant {
    /// Built for the oldest supported kernels.
    Baseline,
    /// Built for kernels with large program support (5.3+).
    Large,
    /// Built for 6.1+ kernels.
    V61,
}

/// Object file names for the generic kprobe and its return probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KprobeObjects {
    /// Entry probe object.
    pub base: &'static str,
    /// Return probe object.
    pub ret: &'static str,
}

impl ProgramVariant {
    /// Generic kprobe objects compiled for this tier.
    pub fn objects(self) -> KprobeObjects {
        match self {
            Self::V61 => KprobeObjects {
                base: "bpf_generic_kprobe_v61.o",
                ret: "bpf_generic_retkprobe_v61.o",
            },
            Self::Large => KprobeObjects {
                base: "bpf_generic_kprobe_v53.o",
                ret: "bpf_generic_retkprobe_v53.o",
            },
            Self::Baseline => KprobeObjects {
                base: "bpf_generic_kprobe.o",
                ret: "bpf_generic_retkprobe.o",
            },
        }
    }
}

impl fmt::Display for ProgramVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Baseline => "baseline",
            Self::Large => "v53",
            Self::V61 => "v61",
        };
        f.write_str(name)
    }
}

/// Choose which generic kprobe objects to load on this kernel.
///
/// Large-program eligibility is only consulted when the v6.1 tier is out.
pub fn select_kprobe_variant<I, P>(policy: &KernelPolicy<'_, I, P>) -> ProgramVariant
where
    I: SystemIdentity,
    P: CapabilityProbe,
{
    if policy.v61_programs_eligible() {
        ProgramVariant::V61
    } else if policy.large_programs_eligible() {
        ProgramVariant::Large
    } else {
        ProgramVariant::Baseline
    }
}

/// Generic kprobe and retprobe object names for this kernel.
pub fn generic_kprobe_objects<I, P>(policy: &KernelPolicy<'_, I, P>) -> KprobeObjects
where
    I: SystemIdentity,
    P: CapabilityProbe,
{
    select_kprobe_variant(policy).objects()
}
