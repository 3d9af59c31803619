// Playlist sanitation - drops unusable entries and deduplicates titles

use std::collections::HashSet;

use serde_json::Value;

use super::models::{Metadata, TITLE_FIELD};

/// Clean up a playlist record in place of the raw extractor output.
///
/// Entries that are null, empty, or lack a non-empty title are removed;
/// the survivors are renumbered contiguously by position. Repeated titles
/// get a ` (n)` suffix so every title is unique. Non-playlist records are
/// returned unchanged.
pub fn sanitize(mut metadata: Metadata) -> Metadata {
    if !metadata.is_playlist() {
        return metadata;
    }

    let kept: Vec<Metadata> = metadata
        .raw_entries()
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(map) if has_title(map) => Some(Metadata::from(map.clone())),
            _ => None,
        })
        .collect();

    let dropped = metadata.raw_entries().len() - kept.len();
    if dropped > 0 {
        tracing::debug!(dropped, "removed invalid playlist entries");
    }

    metadata.set_entries(dedup_titles(kept));
    metadata
}

fn has_title(map: &serde_json::Map<String, Value>) -> bool {
    map.get(TITLE_FIELD)
        .and_then(Value::as_str)
        .is_some_and(|title| !title.trim().is_empty())
}

fn dedup_titles(mut entries: Vec<Metadata>) -> Vec<Metadata> {
    // Generated suffixes must not collide with any original title, even one
    // further down the list, or that title's first occurrence gets renamed.
    let originals: HashSet<String> = entries
        .iter()
        .filter_map(|e| e.title().map(str::to_string))
        .collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());
    let mut issued: HashSet<String> = HashSet::new();

    for entry in &mut entries {
        let Some(title) = entry.title().map(str::to_string) else {
            continue;
        };

        if seen.insert(title.clone()) {
            continue;
        }

        let mut n = 2;
        let unique = loop {
            let candidate = format!("{} ({})", title, n);
            if !originals.contains(&candidate) && !issued.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        issued.insert(unique.clone());
        entry.insert(TITLE_FIELD, Value::String(unique));
    }

    entries
}
