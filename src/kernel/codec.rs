//! Release string to [`KernelVersion`] encoding.
//!
//! Lenient by design of the input: vendors append arbitrary suffixes and
//! sometimes drop trailing components. Only a missing or unparsable major
//! component fails the parse, yielding [`KernelVersion::UNKNOWN`].

use super::KernelVersion;

/// Encode a kernel release string such as `4.19.221-generic+`.
///
/// Everything after the first `-` is dropped, then trailing `+` characters,
/// then the remainder is split on `.` into major, minor and patch. Minor and
/// patch fall back to `0` when absent or unparsable.
pub fn encode(release: &str) -> KernelVersion {
    let numeric = release
        .split('-')
        .next()
        .unwrap_or_default()
        .trim_end_matches('+');

    let mut parts = numeric.split('.');

    let Some(major) = parts.next().and_then(|s| s.parse::<i32>().ok()) else {
        return KernelVersion::UNKNOWN;
    };
    let minor = parse_or_zero(parts.next());
    let patch = parse_or_zero(parts.next());

    KernelVersion::new(major, minor, patch)
}

fn parse_or_zero(part: Option<&str>) -> i32 {
    part.and_then(|s| s.parse().ok()).unwrap_or(0)
}
