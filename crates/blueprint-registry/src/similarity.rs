//! Name similarity for "did you mean" suggestions
//!
//! A cheap tiered heuristic, not an edit distance. Each candidate is scored
//! against the missing name by the first tier that applies:
//!
//! | Tier | Condition (case-insensitive) | Score |
//! |---|---|---|
//! | exact | equal | 1.0 |
//! | containment | one contains the other | 0.8 |
//! | prefix | common prefix longer than 2 | prefix / longest |
//! | positional | otherwise | 1 - mismatches / longest |
//!
//! The positional tier compares characters index by index with the shorter
//! name padded, so it can rank an unrelated same-length name above a closer
//! name of different length. Suggestions are advisory only.

/// Scores at or above this are suggested
pub const SUGGESTION_THRESHOLD: f64 = 0.5;

/// Maximum number of suggestions returned
pub const MAX_SUGGESTIONS: usize = 3;

/// Similarity of two names in `[0.0, 1.0]`
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if contains(&a, &b) || contains(&b, &a) {
        return 0.8;
    }

    let longest = a.len().max(b.len());
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    if prefix > 2 {
        return ratio(prefix, longest);
    }

    let mismatches = (0..longest).filter(|&i| a.get(i) != b.get(i)).count();
    1.0 - ratio(mismatches, longest)
}

/// Up to [`MAX_SUGGESTIONS`] candidates similar to `missing`, best first
///
/// Ties keep candidate order.
#[must_use]
pub fn suggest<'a, I>(missing: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (similarity(missing, candidate), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|x, y| y.0.total_cmp(&x.0));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}
