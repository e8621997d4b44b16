//! kernver — kernel version discovery and program variant selection.
//!
//! Determines the running kernel's version at agent startup, corrects for
//! kernels that misreport it, and picks which precompiled generic kprobe
//! objects the agent should load.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod kernel;
pub mod logging;
