//! Length-preserving binary patching.
//!
//! Substitutes byte strings inside a prebuilt binary without moving any
//! other byte. The replacement is never longer than the pattern; when it
//! is shorter it is right-padded with NUL bytes, which leaves a shorter
//! but correctly terminated C string in a string table. Every offset
//! recorded elsewhere in the file stays valid because the image length
//! never changes.
//!
//! The whole file is read into an owned buffer, transformed, and written
//! back once. Validation happens before the first byte is touched, so a
//! failed operation leaves both the buffer and the file unchanged.

use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::rules::RuleSet;
use crate::scan;

/// How a replacement shorter than its pattern is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadMode {
    /// Replacement must already match the pattern length.
    Exact,
    /// Right-pad the replacement with NUL bytes.
    #[default]
    NullPad,
}

/// Build the bytes that will overwrite each occurrence of `pattern`.
pub fn pad_replacement(pattern: &[u8], replacement: &[u8], mode: PadMode) -> Result<Vec<u8>> {
    if pattern.is_empty() {
        return Err(Error::EmptyPattern);
    }
    if replacement.len() > pattern.len() {
        return Err(Error::LengthOverflow {
            pattern_len: pattern.len(),
            replacement_len: replacement.len(),
        });
    }
    if mode == PadMode::Exact && replacement.len() != pattern.len() {
        return Err(Error::LengthMismatch {
            pattern_len: pattern.len(),
            replacement_len: replacement.len(),
        });
    }

    let mut padded = replacement.to_vec();
    padded.resize(pattern.len(), 0);
    Ok(padded)
}

/// Outcome of a global substitution.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Offsets of every patched region, ascending.
    pub offsets: Vec<usize>,
    /// Length of the pattern (and of each patched region).
    pub pattern_len: usize,
    /// The padded bytes written at each offset.
    pub replacement: Vec<u8>,
}

impl Substitution {
    pub fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Replace every occurrence of `pattern` in `image`.
///
/// Matches are found left to right and do not overlap; the scan resumes
/// after each patched region so bytes just written are never matched
/// again. Fails with [`Error::PatternNotFound`] when there is nothing to
/// replace.
pub fn replace_all(
    image: &mut [u8],
    pattern: &[u8],
    replacement: &[u8],
    mode: PadMode,
) -> Result<Substitution> {
    let padded = pad_replacement(pattern, replacement, mode)?;

    let offsets = scan::find_all(image, pattern);
    if offsets.is_empty() {
        return Err(Error::PatternNotFound {
            pattern: pattern.escape_ascii().to_string(),
        });
    }

    for &off in &offsets {
        debug!("patching {} byte(s) at offset 0x{:x}", padded.len(), off);
        image[off..off + padded.len()].copy_from_slice(&padded);
    }

    Ok(Substitution {
        offsets,
        pattern_len: pattern.len(),
        replacement: padded,
    })
}

/// A single occurrence patched by [`apply_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    /// Index of the rule in its rule set.
    pub rule: usize,
    /// The pattern that matched.
    pub pattern: String,
    /// File offset of the match.
    pub offset: usize,
}

/// Apply an ordered rule list to `image`.
///
/// Each rule replaces all occurrences of its own pattern, padded to that
/// pattern's length. Every rule is matched against the unpatched image
/// and rule order decides overlaps: a match touching bytes already
/// claimed by an earlier match is skipped, so no byte is patched twice.
/// A rule set with nothing to match is not an error: the returned list is
/// simply empty.
pub fn apply_rules(image: &mut [u8], rules: &RuleSet) -> Result<Vec<RuleHit>> {
    // Reject the whole set before touching the image.
    let prepared = rules
        .rules
        .iter()
        .map(|r| {
            let padded =
                pad_replacement(r.pattern.as_bytes(), r.replacement.as_bytes(), PadMode::NullPad)?;
            Ok((r.pattern.as_bytes(), padded))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut claimed = vec![false; image.len()];
    let mut hits = Vec::new();
    for (idx, (pattern, _)) in prepared.iter().enumerate() {
        let mut pos = 0;
        while let Some(off) = scan::find(image, pattern, pos) {
            let region = off..off + pattern.len();
            if claimed[region.clone()].contains(&true) {
                debug!("rule {}: offset 0x{:x} overlaps an earlier match, skipped", idx, off);
                pos = off + 1;
                continue;
            }
            claimed[region].fill(true);
            debug!("rule {}: '{}' at offset 0x{:x}", idx, rules.rules[idx].pattern, off);
            hits.push(RuleHit {
                rule: idx,
                pattern: rules.rules[idx].pattern.clone(),
                offset: off,
            });
            pos = off + pattern.len();
        }
    }

    for hit in &hits {
        let padded = &prepared[hit.rule].1;
        image[hit.offset..hit.offset + padded.len()].copy_from_slice(padded);
    }

    Ok(hits)
}

/// Options for [`patch_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchOptions {
    pub mode: PadMode,
    /// Append a NUL terminator to both strings so only a complete
    /// C-string tail matches.
    pub nul_terminated: bool,
    /// Compute the patch but leave the file alone.
    pub dry_run: bool,
}

/// Result of patching a file on disk.
#[derive(Debug, Clone)]
pub struct FilePatch {
    /// File size, identical before and after.
    pub file_size: usize,
    pub substitution: Substitution,
    /// Whether the image was written back.
    pub written: bool,
}

/// Replace every occurrence of `old` with `new` in the file at `path`.
///
/// The file is only rewritten once the in-memory substitution succeeded.
pub fn patch_file(path: &Path, old: &[u8], new: &[u8], opts: &PatchOptions) -> Result<FilePatch> {
    let (old, new) = if opts.nul_terminated {
        ([old, b"\0"].concat(), [new, b"\0"].concat())
    } else {
        (old.to_vec(), new.to_vec())
    };

    let mut image = std::fs::read(path)?;
    let file_size = image.len();
    let substitution = replace_all(&mut image, &old, &new, opts.mode)?;
    debug_assert_eq!(image.len(), file_size);

    let written = commit(path, &image, opts.dry_run)?;
    info!(
        "{}: {} occurrence(s) of '{}' replaced{}",
        path.display(),
        substitution.count(),
        old.escape_ascii(),
        if written { "" } else { " (dry run)" }
    );

    Ok(FilePatch {
        file_size,
        substitution,
        written,
    })
}

/// Result of [`force_patch_file`].
#[derive(Debug, Clone)]
pub struct ForcePatch {
    pub hits: Vec<RuleHit>,
    pub written: bool,
}

/// Apply `rules` to the file at `path`, writing back only if something
/// matched.
pub fn force_patch_file(path: &Path, rules: &RuleSet, dry_run: bool) -> Result<ForcePatch> {
    let mut image = std::fs::read(path)?;
    let hits = apply_rules(&mut image, rules)?;

    let written = if hits.is_empty() {
        false
    } else {
        commit(path, &image, dry_run)?
    };
    info!("{}: {} rule hit(s)", path.display(), hits.len());

    Ok(ForcePatch {
        hits,
        written,
    })
}

fn commit(path: &Path, image: &[u8], dry_run: bool) -> Result<bool> {
    if dry_run {
        return Ok(false);
    }
    std::fs::write(path, image)?;
    Ok(true)
}
