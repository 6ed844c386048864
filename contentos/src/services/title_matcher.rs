//! Fuzzy matching of upload titles to kit folder slugs
//!
//! Uploads are titled by hand, so a kit `melting_clock` may go out as
//! "Melting Clock Loop". Matching is case-insensitive normalized
//! Levenshtein similarity over the slug with underscores read as spaces.

/// A candidate must score strictly above this to match
pub const MATCH_THRESHOLD: f64 = 0.4;

/// Similarity of a kit slug to an upload title, 0.0 to 1.0
pub fn similarity(slug: &str, title: &str) -> f64 {
    let name = slug.replace('_', " ").to_lowercase();
    strsim::normalized_levenshtein(&name, &title.to_lowercase())
}

/// Best-scoring title above [`MATCH_THRESHOLD`]; earlier candidates win ties
pub fn best_match<'a, T, S: AsRef<str>>(
    slug: &str,
    candidates: &'a [T],
    title: impl Fn(&T) -> S,
) -> Option<(&'a T, f64)> {
    let mut best: Option<(&'a T, f64)> = None;
    for candidate in candidates {
        let score = similarity(slug, title(candidate).as_ref());
        if score > MATCH_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best
}
