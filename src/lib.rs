//! sopatch — length-preserving string patching for prebuilt ELF shared libraries.
//!
//! Renames SONAMEs, DT_NEEDED entries and rpath strings in place, without
//! relinking. A replacement is never longer than the string it replaces
//! and is NUL-padded when shorter, so the file keeps its exact size and
//! every offset recorded inside it stays valid.
//!
//! # Module overview
//!
//! - [`error`] — Error types used throughout the crate.
//! - [`scan`] — Exact, non-overlapping byte-sequence search.
//! - [`patch`] — Padding rules, global substitution and on-disk commit.
//! - [`rules`] — Ordered pattern/replacement lists for multi-target patching.
//! - [`elf`] — Read-only view of the dynamic section (SONAME, NEEDED, RPATH).

pub mod error;
pub mod scan;
pub mod patch;
pub mod rules;
pub mod elf;
