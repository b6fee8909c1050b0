//! Approximate lookup of error text against the reference catalog.
//!
//! Two query modes are offered: [`best_match`] answers "which single known
//! error is this text", [`find_all`] answers "which known errors appear in
//! this log".

use crate::catalog::ErrorSignature;

/// Minimum similarity for a catalog entry to count as a match.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Normalized edit-distance ratio in `[0, 1]`; symmetric, 1.0 for equal strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Score of `query` against a signature pattern.
///
/// A pattern contained in the query (case-insensitively) scores 1.0. Otherwise
/// the best ratio over the whole query and each of its non-blank lines is
/// used, so a single matching line in a log tail is enough.
pub fn similarity(query: &str, pattern: &str) -> f64 {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return 0.0;
    }
    if contains_ignore_case(query, pattern) {
        return 1.0;
    }

    let whole = ratio(query.trim(), pattern);
    query
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ratio(line, pattern))
        .fold(whole, f64::max)
}

/// Highest scoring signature at or above `threshold`. Ties keep catalog order.
pub fn best_match<'a>(
    query: &str,
    catalog: &'a [ErrorSignature],
    threshold: f64,
) -> Option<&'a ErrorSignature> {
    let mut best: Option<(&ErrorSignature, f64)> = None;
    for signature in catalog {
        let score = similarity(query, &signature.pattern);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((signature, score));
        }
    }

    best.filter(|(_, score)| *score >= threshold)
        .map(|(signature, _)| signature)
}

/// Every signature whose pattern occurs in `text`, in catalog order.
pub fn find_all<'a>(text: &str, catalog: &'a [ErrorSignature]) -> Vec<&'a ErrorSignature> {
    catalog
        .iter()
        .filter(|signature| {
            let pattern = signature.pattern.trim();
            !pattern.is_empty() && contains_ignore_case(text, pattern)
        })
        .collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
