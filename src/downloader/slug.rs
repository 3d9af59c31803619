// Default file name slugifier

use lazy_static::lazy_static;
use regex::Regex;

use super::traits::Slugifier;

lazy_static! {
    static ref UNSAFE_RE: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1F%]+"#).unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[\s_-]+").unwrap();
}

const MAX_SLUG_CHARS: usize = 120;

/// Keeps letters of any script, collapses separators into `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSlugifier;

impl Slugifier for DefaultSlugifier {
    fn slugify(&self, input: &str) -> String {
        let cleaned = UNSAFE_RE.replace_all(input, " ");
        let collapsed = SEPARATOR_RE.replace_all(cleaned.trim(), "-");
        let slug: String = collapsed
            .trim_matches(|c: char| c == '-' || c == '.')
            .chars()
            .take(MAX_SLUG_CHARS)
            .collect();

        if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug
        }
    }
}
