//! Index entry parsing.

use std::collections::HashSet;

use common::index::IndexEntry;
use common::matchers::{MatchType, Matcher};
use common::serde::decode_entry_range;

use crate::error::Result;
use crate::set_matches::find_set_matches;

/// Parses index entries into series IDs (or chunk keys), applying the
/// matcher to each entry's label value.
///
/// Regexp matchers equivalent to a finite literal set are answered by a set
/// lookup without running the regex engine per entry. The result is sorted
/// and deduplicated so it can be merged with other matchers' results.
pub(crate) fn parse_index_entries(
    entries: &[IndexEntry],
    matcher: Option<&Matcher>,
) -> Result<Vec<String>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut match_set: HashSet<String> = HashSet::new();
    if let Some(matcher) = matcher {
        if matcher.match_type() == MatchType::Re {
            match_set = find_set_matches(matcher.value()).into_iter().collect();
        }
    }

    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        let (chunk_key, label_value) = decode_entry_range(&entry.range_value)?;

        // A set-like matcher (=~"a|b|c|...") accepts exactly the values in
        // the set; no need to run the matcher on entries inside it.
        if !match_set.is_empty() {
            if match_set.contains(&label_value) {
                result.push(chunk_key);
            }
            continue;
        }

        if let Some(matcher) = matcher {
            if !matcher.matches(&label_value) {
                continue;
            }
        }
        result.push(chunk_key);
    }

    // Sorted and deduped because the caller merges this with other sets.
    result.sort_unstable();
    result.dedup();
    Ok(result)
}
