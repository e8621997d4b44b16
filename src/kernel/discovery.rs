//! Resolving the running kernel's version.
//!
//! Sources, first available wins:
//! 1. an explicit override from configuration,
//! 2. the last token of `<procfs>/version_signature`,
//! 3. the release field of `uname(2)`.
//!
//! Discovery never fails. When uname itself is unavailable the identity is
//! [`KernelVersion::UNKNOWN`] with display string `"unknown"`, and callers
//! fall back to capability probing.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::{codec, quirks, KernelVersion};

/// File under the procfs root carrying the upstream version as its last token.
pub const VERSION_SIGNATURE_FILE: &str = "version_signature";

/// Display string used when no source could be read.
pub const UNKNOWN_DISPLAY: &str = "unknown";

/// Errors from the system identification call.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The uname syscall failed.
    #[error("uname failed: {0}")]
    Uname(#[from] nix::errno::Errno),
}

/// Source of the kernel release string.
pub trait SystemIdentity {
    /// The kernel release, e.g. `5.15.0-91-generic`.
    fn release(&self) -> Result<String, IdentityError>;
}

impl<I: SystemIdentity + ?Sized> SystemIdentity for &I {
    fn release(&self) -> Result<String, IdentityError> {
        (**self).release()
    }
}

/// [`SystemIdentity`] backed by `uname(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uname;

impl SystemIdentity for Uname {
    fn release(&self) -> Result<String, IdentityError> {
        let uts = nix::sys::utsname::uname()?;
        Ok(uts.release().to_string_lossy().into_owned())
    }
}

/// Which source produced a [`KernelIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// Explicit override from configuration.
    Override,
    /// `<procfs>/version_signature`.
    Signature,
    /// `uname(2)` release field.
    Uname,
    /// Nothing could be read.
    Unknown,
}

impl VersionSource {
    /// Short lowercase name for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Signature => "signature",
            Self::Uname => "uname",
            Self::Unknown => "unknown",
        }
    }
}

/// The running kernel's version, as discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelIdentity {
    /// Version as encoded from the source, before quirk correction.
    pub version: KernelVersion,
    /// The substring that was encoded, or `"unknown"`.
    pub display: String,
    /// Where the version came from.
    pub source: VersionSource,
}

impl KernelIdentity {
    fn unknown() -> Self {
        Self {
            version: KernelVersion::UNKNOWN,
            display: UNKNOWN_DISPLAY.to_owned(),
            source: VersionSource::Unknown,
        }
    }

    /// The version after known reporting bugs are corrected.
    pub fn corrected(&self) -> KernelVersion {
        quirks::correct(self.version)
    }
}

/// Resolve the running kernel's identity.
///
/// `explicit_override` wins when non-empty. Otherwise the signature file under
/// `procfs` is tried, then `identity`. Read failures fall through silently.
pub fn discover(
    explicit_override: Option<&str>,
    procfs: &Path,
    identity: &impl SystemIdentity,
) -> KernelIdentity {
    if let Some(release) = explicit_override.filter(|s| !s.is_empty()) {
        let version = codec::encode(release);
        if version.is_unknown() {
            warn!(release, "kernel version override has no parsable major version");
        }
        debug!(release, %version, "kernel version from override");
        return KernelIdentity {
            version,
            display: release.to_owned(),
            source: VersionSource::Override,
        };
    }

    if let Some(token) = read_signature(procfs) {
        let version = codec::encode(&token);
        debug!(token = %token, %version, "kernel version from version_signature");
        return KernelIdentity {
            version,
            display: token,
            source: VersionSource::Signature,
        };
    }

    match identity.release() {
        Ok(release) => {
            let version = codec::encode(&release);
            let display = release.split('-').next().unwrap_or_default().to_owned();
            debug!(release = %release, %version, "kernel version from uname");
            KernelIdentity {
                version,
                display,
                source: VersionSource::Uname,
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot identify kernel, deferring to capability probes");
            KernelIdentity::unknown()
        }
    }
}

/// Last whitespace-separated token of the signature file, if any.
///
/// Invalid UTF-8 elsewhere in the file does not hide the token.
fn read_signature(procfs: &Path) -> Option<String> {
    let path = procfs.join(VERSION_SIGNATURE_FILE);
    let bytes = std::fs::read(&path)
        .map_err(|e| debug!(path = %path.display(), error = %e, "version_signature unavailable"))
        .ok()?;
    String::from_utf8_lossy(&bytes)
        .split_whitespace()
        .last()
        .map(str::to_owned)
}
