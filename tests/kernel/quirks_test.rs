//! Tests for kernel version quirk correction.

use kernver::kernel::{correct, encode, KernelVersion, KNOWN_QUIRKS};

#[test]
fn broken_4_19_sublevel_is_pinned_to_255() {
    assert_eq!(correct(encode("4.19.225")), KernelVersion::new(4, 19, 255));
}

#[test]
fn sublevel_just_below_range_is_kept() {
    assert_eq!(correct(encode("4.19.220")), encode("4.19.220"));
}

#[test]
fn corrected_version_still_below_next_branch() {
    assert!(correct(encode("4.19.230")) < encode("4.20.0"));
}

#[test]
fn table_has_the_4_19_entry() {
    assert!(KNOWN_QUIRKS
        .iter()
        .any(|q| q.matches(KernelVersion::new(4, 19, 221))));
}
