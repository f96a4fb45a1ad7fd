//! Exact byte-sequence search.
//!
//! Matches are reported left to right and never overlap: after a hit
//! the search resumes at the first byte past the matched region, which
//! is where a substitution would stop writing.

/// Find the first occurrence of `needle` at or after `from`.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Scan a buffer for every non-overlapping occurrence of `needle`.
pub fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut matches = Vec::new();
    let mut pos = 0;
    while let Some(off) = find(haystack, needle, pos) {
        matches.push(off);
        pos = off + needle.len();
    }
    matches
}
