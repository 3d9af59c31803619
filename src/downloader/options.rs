// Option store - extractor flags as an ordered name/value list

/// Playlist knobs resolved locally, never passed to the extractor
pub const PLAYLIST_START: &str = "playlist-start";
pub const PLAYLIST_END: &str = "playlist-end";
pub const PLAYLIST_ITEMS: &str = "playlist-items";
pub const PLAYLIST_REVERSE: &str = "playlist-reverse";
pub const PLAYLIST_RANDOM: &str = "playlist-random";

pub const PLAYLIST_FLAGS: [&str; 5] = [
    PLAYLIST_START,
    PLAYLIST_END,
    PLAYLIST_ITEMS,
    PLAYLIST_REVERSE,
    PLAYLIST_RANDOM,
];

pub const FORMAT: &str = "format";
pub const OUTPUT: &str = "output";

/// Extractor options keyed by flag name (without leading dashes).
///
/// Presence-only flags hold `None`. Insertion order is kept so the
/// rendered argument list is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionStore {
    entries: Vec<(String, Option<String>)>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(name: &str) -> &str {
        name.trim_start_matches('-')
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = Self::normalize(name);
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Value of an option. Returns `None` both for missing options and
    /// presence-only flags; use `is_set` to tell them apart.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|i| self.entries[i].1.as_deref())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a valued option, replacing any previous value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.put(name, Some(value.into()))
    }

    /// Set a presence-only flag.
    pub fn set_flag(&mut self, name: &str) -> &mut Self {
        self.put(name, None)
    }

    fn put(&mut self, name: &str, value: Option<String>) -> &mut Self {
        match self.position(name) {
            Some(i) => self.entries[i].1 = value,
            None => self
                .entries
                .push((Self::normalize(name).to_string(), value)),
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every option as `--name [value]`.
    pub fn to_args(&self) -> Vec<String> {
        self.to_args_excluding(&[])
    }

    /// Render options as `--name [value]`, skipping the given names.
    pub fn to_args_excluding(&self, excluded: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);

        for (name, value) in &self.entries {
            if excluded.contains(&name.as_str()) {
                continue;
            }
            args.push(format!("--{}", name));
            if let Some(value) = value {
                args.push(value.clone());
            }
        }

        args
    }

    /// Arguments safe to hand to the extractor: playlist knobs removed.
    pub fn extractor_args(&self) -> Vec<String> {
        self.to_args_excluding(&PLAYLIST_FLAGS)
    }
}
