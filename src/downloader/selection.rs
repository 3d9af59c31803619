// Playlist selection - turns range/list options into entry indexes

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use super::options::{
    OptionStore, PLAYLIST_END, PLAYLIST_ITEMS, PLAYLIST_RANDOM, PLAYLIST_REVERSE, PLAYLIST_START,
};

lazy_static! {
    static ref SINGLE_RE: Regex = Regex::new(r"^\d+$").unwrap();
    static ref RANGE_RE: Regex = Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap();
}

/// Which playlist entries to act on. All numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSelection {
    pub start: Option<usize>,
    pub end: Option<usize>,
    /// Comma-separated item numbers and `a-b` ranges; overrides start/end
    pub items: Option<String>,
    pub reverse: bool,
    pub random: bool,
}

impl PlaylistSelection {
    /// Derive the selection from the playlist knobs of an option store.
    ///
    /// Unparseable start/end values fall back to their defaults.
    pub fn from_options(options: &OptionStore) -> Self {
        Self {
            start: parse_bound(options, PLAYLIST_START),
            end: parse_bound(options, PLAYLIST_END),
            items: options
                .get(PLAYLIST_ITEMS)
                .map(str::trim)
                .filter(|items| !items.is_empty())
                .map(str::to_string),
            reverse: options.is_set(PLAYLIST_REVERSE),
            random: options.is_set(PLAYLIST_RANDOM),
        }
    }

    pub fn with_range(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_items(mut self, items: impl Into<String>) -> Self {
        self.items = Some(items.into());
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }
}

fn parse_bound(options: &OptionStore, name: &str) -> Option<usize> {
    let raw = options.get(name)?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(option = name, value = raw, "ignoring non-numeric playlist bound");
            None
        }
    }
}

/// Expand an items list into a sorted, deduplicated set of 1-based item
/// numbers no greater than `total`.
///
/// Inverted ranges (`5-3`), zero, and malformed tokens contribute nothing.
pub fn expand_items(items: &str, total: usize) -> Vec<usize> {
    let mut selected = BTreeSet::new();

    for token in items.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if SINGLE_RE.is_match(token) {
            if let Ok(n) = token.parse::<usize>() {
                selected.insert(n);
            }
        } else if let Some(caps) = RANGE_RE.captures(token) {
            let (Ok(from), Ok(to)) = (caps[1].parse::<usize>(), caps[2].parse::<usize>()) else {
                continue;
            };
            if from <= to {
                // Values above `total` are dropped anyway; don't walk past it.
                selected.extend(from..=to.min(total.max(from)));
            }
        } else {
            tracing::debug!(token, "ignoring malformed playlist item token");
        }
    }

    selected
        .into_iter()
        .filter(|n| (1..=total).contains(n))
        .collect()
}

/// Resolve a selection against `total` entries into 0-based indexes, in
/// the order entries should be processed.
pub fn resolve_indexes_with<R: Rng + ?Sized>(
    total: usize,
    selection: &PlaylistSelection,
    rng: &mut R,
) -> Vec<usize> {
    let mut numbers: Vec<usize> = match &selection.items {
        Some(items) => expand_items(items, total),
        None => {
            let start = selection.start.unwrap_or(1).max(1);
            let end = selection.end.unwrap_or(total).min(total);
            if start > end {
                Vec::new()
            } else {
                (start..=end).collect()
            }
        }
    };

    if selection.reverse {
        numbers.reverse();
    } else if selection.random {
        numbers.shuffle(rng);
    }

    numbers.into_iter().map(|n| n - 1).collect()
}

/// Resolve with the thread-local random generator.
pub fn resolve_indexes(total: usize, selection: &PlaylistSelection) -> Vec<usize> {
    resolve_indexes_with(total, selection, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_selects_everything() {
        let sel = PlaylistSelection::default();
        assert_eq!(resolve_indexes(4, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_basic_range() {
        let sel = PlaylistSelection::default().with_range(Some(3), Some(5));
        assert_eq!(resolve_indexes(10, &sel), vec![2, 3, 4]);
    }

    #[test]
    fn test_range_end_clamped_to_total() {
        let sel = PlaylistSelection::default().with_range(Some(8), Some(50));
        assert_eq!(resolve_indexes(10, &sel), vec![7, 8, 9]);
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let sel = PlaylistSelection::default().with_range(Some(6), Some(2));
        assert!(resolve_indexes(10, &sel).is_empty());
        let sel = PlaylistSelection::default().with_range(Some(12), None);
        assert!(resolve_indexes(10, &sel).is_empty());
    }

    #[test]
    fn test_items_with_range_token() {
        let sel = PlaylistSelection::default().with_items("1,3-5,20");
        assert_eq!(resolve_indexes(10, &sel), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_items_override_range() {
        let sel = PlaylistSelection::default()
            .with_range(Some(7), Some(9))
            .with_items("2");
        assert_eq!(resolve_indexes(10, &sel), vec![1]);
    }

    #[test]
    fn test_items_dedup_and_sort() {
        let sel = PlaylistSelection::default().with_items("5, 2-4 ,3,0,x,");
        assert_eq!(resolve_indexes(10, &sel), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_inverted_range_token_contributes_nothing() {
        assert_eq!(expand_items("5-3", 10), Vec::<usize>::new());
        assert_eq!(expand_items("5-3,7", 10), vec![7]);
    }

    #[test]
    fn test_huge_range_is_bounded() {
        assert_eq!(expand_items("9-18446744073709551615", 10), vec![9, 10]);
    }

    #[test]
    fn test_reverse() {
        let sel = PlaylistSelection::default()
            .with_items("1,3-5,20")
            .with_reverse(true);
        assert_eq!(resolve_indexes(10, &sel), vec![4, 3, 2, 0]);
    }

    #[test]
    fn test_reverse_wins_over_random() {
        let sel = PlaylistSelection::default()
            .with_range(Some(1), Some(5))
            .with_reverse(true)
            .with_random(true);
        assert_eq!(resolve_indexes(10, &sel), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_random_is_permutation() {
        let sel = PlaylistSelection::default()
            .with_items("1,3-5,20")
            .with_random(true);
        let mut rng = StdRng::seed_from_u64(7);
        let mut got = resolve_indexes_with(10, &sel, &mut rng);
        got.sort_unstable();
        assert_eq!(got, vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_never_out_of_bounds() {
        let sel = PlaylistSelection::default().with_items("1-100");
        let got = resolve_indexes(3, &sel);
        assert_eq!(got, vec![0, 1, 2]);
        assert!(resolve_indexes(0, &PlaylistSelection::default()).is_empty());
    }

    #[test]
    fn test_from_options() {
        let mut opts = OptionStore::new();
        opts.set(PLAYLIST_START, "2")
            .set(PLAYLIST_END, "oops")
            .set_flag(PLAYLIST_RANDOM);

        let sel = PlaylistSelection::from_options(&opts);
        assert_eq!(sel.start, Some(2));
        assert_eq!(sel.end, None);
        assert_eq!(sel.items, None);
        assert!(sel.random);
        assert!(!sel.reverse);
    }
}
