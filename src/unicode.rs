//! Unicode string helpers: UTF-8 <-> code-point sequence conversion, trim,
//! split, case folding. Stands in for a real ICU binding, which is out of
//! scope for this on-device core.

use std::fmt;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// A single code point in [0x0, 0x10FFFF]. Not every value is a valid `char`
/// (surrogates are representable here but not in `char`); those are passed
/// through unchanged by case-folding and comparisons.
pub type CodePoint = u32;

/// Reserved child key linking a terminal node's sub-trie to the next word in
/// an n-gram. Never produced by UTF-8 decoding of ordinary text, so it is
/// safe to special-case at the dictionary API boundary.
pub const NGRAM_SEPARATOR: CodePoint = 0x1F;

/// The canonical internal word representation: an ordered, finite sequence
/// of code points. All trie keys are `UniString`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UniString(Vec<CodePoint>);

impl UniString {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_code_points(points: Vec<CodePoint>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[CodePoint] {
        &self.0
    }

    pub fn push(&mut self, cp: CodePoint) {
        self.0.push(cp);
    }

    pub fn pop(&mut self) -> Option<CodePoint> {
        self.0.pop()
    }

    pub fn contains(&self, cp: CodePoint) -> bool {
        self.0.contains(&cp)
    }

    /// Truncates to `max_len` code points, the implementation ceiling beyond
    /// which a query is silently shortened before search rather than
    /// rejected.
    pub fn truncate(&mut self, max_len: usize) {
        self.0.truncate(max_len);
    }

    /// Renders back to a UTF-8 `String`. Code points outside the valid
    /// `char` range (surrogates) are replaced with U+FFFD, matching the
    /// behavior of `String::from_utf8_lossy` at the API boundary.
    pub fn to_utf8_string(&self) -> String {
        self.0
            .iter()
            .map(|&cp| char::from_u32(cp).unwrap_or('\u{FFFD}'))
            .collect()
    }
}

impl fmt::Display for UniString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_utf8_string())
    }
}

impl From<&str> for UniString {
    fn from(s: &str) -> Self {
        Self(s.chars().map(|c| c as CodePoint).collect())
    }
}

impl From<String> for UniString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// NFC-canonicalizes a UTF-8 string, used to establish word identity when
/// merging candidates pulled from more than one dictionary.
pub fn nfc_canonicalize(s: &str) -> String {
    s.nfc().collect()
}

fn case_fold_table() -> &'static OnceLock<()> {
    static TABLE: OnceLock<()> = OnceLock::new();
    &TABLE
}

/// Process-wide, idempotent initialization standing in for the Unicode
/// runtime's one-time data-file load. Call once before the first dictionary
/// load; failure here is fatal.
pub fn icu_init() {
    case_fold_table().get_or_init(|| ());
}

/// Simple (not full) case fold of a single code point, sufficient for
/// shift-state handling during fuzzy search. Falls back to the code point
/// itself for non-`char` values.
pub fn simple_fold(cp: CodePoint) -> CodePoint {
    match char::from_u32(cp) {
        Some(c) => c.to_lowercase().next().map(|c| c as CodePoint).unwrap_or(cp),
        None => cp,
    }
}

pub fn is_lower(cp: CodePoint) -> bool {
    char::from_u32(cp).map(|c| c.is_lowercase()).unwrap_or(false)
}

pub fn to_upper(cp: CodePoint) -> CodePoint {
    match char::from_u32(cp) {
        Some(c) => c.to_uppercase().next().map(|c| c as CodePoint).unwrap_or(cp),
        None => cp,
    }
}

/// Title-cases a `UniString` by uppercasing only its first code point.
pub fn title_case(word: &UniString) -> UniString {
    let mut points = word.as_slice().to_vec();
    if let Some(first) = points.first_mut() {
        *first = to_upper(*first);
    }
    UniString::from_code_points(points)
}

/// Uppercases every code point, used for the CAPS_LOCK shift-state variant.
pub fn upper_case(word: &UniString) -> UniString {
    UniString::from_code_points(word.as_slice().iter().copied().map(to_upper).collect())
}

pub fn trim(s: &str) -> &str {
    s.trim()
}

pub fn split_whitespace(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii() {
        let u = UniString::from("hello");
        assert_eq!(u.to_utf8_string(), "hello");
        assert_eq!(u.len(), 5);
    }

    #[test]
    fn title_case_only_first_char() {
        let u = UniString::from("hello");
        assert_eq!(title_case(&u).to_utf8_string(), "Hello");
    }

    #[test]
    fn upper_case_all_chars() {
        let u = UniString::from("hello");
        assert_eq!(upper_case(&u).to_utf8_string(), "HELLO");
    }

    #[test]
    fn truncate_bounds_length() {
        let mut u = UniString::from("abcdefgh");
        u.truncate(4);
        assert_eq!(u.to_utf8_string(), "abcd");
    }

    #[test]
    fn nfc_combines_decomposed_accents() {
        let decomposed = "e\u{0301}"; // e + combining acute accent
        assert_eq!(nfc_canonicalize(decomposed), "\u{00e9}");
    }
}
