//! Running-kernel version detection and program variant selection.
//!
//! Data flows one way: a raw release string is packed into a
//! [`KernelVersion`] by [`codec`], corrected for known reporting bugs by
//! [`quirks`], compared against thresholds by [`policy`], and finally mapped
//! to a pair of program objects by [`selector`]. [`discovery`] decides which
//! raw string to start from.

use std::fmt;

use serde::Serialize;

pub mod codec;
pub mod discovery;
pub mod policy;
pub mod quirks;
pub mod selector;

pub use codec::encode;
pub use discovery::{discover, IdentityError, KernelIdentity, SystemIdentity, Uname, VersionSource};
pub use policy::{CapabilityProbe, KernelPolicy, StaticProbes};
pub use quirks::{correct, VersionQuirk, KNOWN_QUIRKS};
pub use selector::{generic_kprobe_objects, select_kprobe_variant, KprobeObjects, ProgramVariant};

/// Canonical packed kernel version: `(major << 16) | (minor << 8) | patch`.
///
/// Integer order matches version order for well-formed versions. Components
/// are not clamped, so an oversized component spills into the field above it.
/// The zero code is the "could not determine" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct KernelVersion(i32);

impl KernelVersion {
    /// Sentinel for an unparsable or undiscoverable version.
    pub const UNKNOWN: Self = Self(0);

    /// Wrap an already-packed version code.
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Pack three components into a version.
    pub fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self(
            major
                .wrapping_shl(16)
                .wrapping_add(minor.wrapping_shl(8))
                .wrapping_add(patch),
        )
    }

    /// The packed integer.
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Bits 16..24 of the code.
    pub fn major(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Bits 8..16 of the code.
    pub fn minor(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    /// Bits 0..8 of the code (the kernel's "sublevel").
    pub fn patch(self) -> u8 {
        self.0.to_be_bytes()[3]
    }

    /// Returns `true` for the [`KernelVersion::UNKNOWN`] sentinel.
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}
