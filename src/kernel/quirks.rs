//! Corrections for kernels that misreport their own version.
//!
//! Each [`VersionQuirk`] matches one stable branch and a range of sublevels
//! known to be reported wrongly, and pins the sublevel to a fixed value.
//! Rules are applied in table order, each seeing the previous rule's output.

use std::ops::RangeInclusive;

use tracing::debug;

use super::KernelVersion;

/// Mask selecting the major and minor fields of a version code.
const BRANCH_MASK: i32 = 0x00ff_ff00;

/// Mask selecting the sublevel (patch) field of a version code.
const SUBLEVEL_MASK: i32 = 0x0000_00ff;

/// One range-correction rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionQuirk {
    /// Major/minor code of the affected branch, sublevel bits zero.
    pub branch: i32,
    /// Affected sublevels, inclusive.
    pub sublevels: RangeInclusive<i32>,
    /// Sublevel to report instead.
    pub corrected_sublevel: u8,
}

impl VersionQuirk {
    /// Returns `true` if `version` falls inside this rule.
    pub fn matches(&self, version: KernelVersion) -> bool {
        let code = version.code();
        code & BRANCH_MASK == self.branch && self.sublevels.contains(&(code & SUBLEVEL_MASK))
    }

    /// Apply the rule, returning `version` unchanged when it does not match.
    pub fn apply(&self, version: KernelVersion) -> KernelVersion {
        if !self.matches(version) {
            return version;
        }
        let code = (version.code() & !SUBLEVEL_MASK) | i32::from(self.corrected_sublevel);
        KernelVersion::from_code(code)
    }
}

/// Known version-reporting bugs.
///
/// linux-stable commit a256aac5 made 4.19.221 through 4.19.231 report a
/// sublevel of 255 to userspace regardless of the real one, so anything
/// in that range is treated as 4.19.255.
pub const KNOWN_QUIRKS: &[VersionQuirk] = &[VersionQuirk {
    branch: 0x04_13_00,
    sublevels: 221..=231,
    corrected_sublevel: 255,
}];

/// Run `version` through every rule in [`KNOWN_QUIRKS`].
pub fn correct(version: KernelVersion) -> KernelVersion {
    correct_with(KNOWN_QUIRKS, version)
}

/// Run `version` through every rule in `quirks`, in order.
pub fn correct_with(quirks: &[VersionQuirk], version: KernelVersion) -> KernelVersion {
    quirks.iter().fold(version, |current, quirk| {
        let patched = quirk.apply(current);
        if patched != current {
            debug!(from = %current, to = %patched, "applied kernel version quirk");
        }
        patched
    })
}
