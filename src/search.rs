use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::models::PasswordMap;

/// Entries whose name fuzzy-matches `query`, best match first. An empty query
/// returns every entry in name order.
pub fn filter_entries<'a>(entries: &'a PasswordMap, query: &str) -> Vec<(&'a str, &'a str)> {
    let query = query.trim();
    if query.is_empty() {
        return entries
            .iter()
            .map(|(name, password)| (name.as_str(), password.as_str()))
            .collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &str, &str)> = entries
        .iter()
        .filter_map(|(name, password)| {
            matcher
                .fuzzy_match(name, query)
                .map(|score| (score, name.as_str(), password.as_str()))
        })
        .collect();
    // BTreeMap iteration is name-ordered and sort_by is stable, so ties stay alphabetical.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .map(|(_, name, password)| (name, password))
        .collect()
}

/// The entry named exactly `query`. A case-insensitive hit is accepted only
/// when it is unambiguous.
pub fn exact_match<'a>(entries: &'a PasswordMap, query: &str) -> Option<(&'a str, &'a str)> {
    let wanted = query.trim();
    if let Some((name, password)) = entries.get_key_value(wanted) {
        return Some((name.as_str(), password.as_str()));
    }

    let mut hits = entries
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(wanted));
    match (hits.next(), hits.next()) {
        (Some((name, password)), None) => Some((name.as_str(), password.as_str())),
        _ => None,
    }
}

/// Up to `limit` entry names close to `query`, for "did you mean" hints.
pub fn suggestions<'a>(entries: &'a PasswordMap, query: &str, limit: usize) -> Vec<&'a str> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    filter_entries(entries, query)
        .into_iter()
        .take(limit)
        .map(|(name, _)| name)
        .collect()
}
