//! Venue-name canonicalization.
//!
//! Raw venue names scraped from DBLP are inconsistently formatted: edition
//! numbers in parentheses, trailing location clauses, leaked HTML entities.
//! `normalize` reduces them to the comparison key used for patch-table
//! lookups, cache keys, and match targets.

/// Canonicalize a raw venue name into a comparison key.
///
/// Truncates at the first `(` and `,`, strips `:` and literal `&amp;`
/// sequences, collapses whitespace, and lowercases. Idempotent.
pub fn normalize(raw: &str) -> String {
    let mut s = raw;
    if let Some(idx) = s.find('(') {
        s = &s[..idx];
    }
    if let Some(idx) = s.find(',') {
        s = &s[..idx];
    }
    let s = s.replace(':', "");
    // Entity leakage from innerText extraction. Stripped before the
    // whitespace collapse so the result never holds a double space.
    let s = s.replace("&amp;", "");
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
