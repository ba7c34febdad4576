//! Spell-check policy wrapper on top of [`crate::session::Session::suggest`]:
//! exact-match short-circuit, typo-fallback suggestion lookup, and a packed
//! verdict bitfield describing what the caller's UI should do with a word.

use crate::core::types::{ShiftState, SuggestionRequestFlags};
use crate::session::Session;

const IN_DICTIONARY: u32 = 1 << 0;
const LOOKS_LIKE_TYPO: u32 = 1 << 1;
const HAS_RECOMMENDED_SUGGESTIONS: u32 = 1 << 2;
const LOOKS_LIKE_GRAMMAR_ERROR: u32 = 1 << 3;
const DONT_SHOW_UI: u32 = 1 << 4;

/// Packed bitfield describing a spell-checked word, following the same
/// packed-`u32` idiom as [`SuggestionRequestFlags`] rather than pulling in a
/// flags crate for five bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpellingVerdict(u32);

impl SpellingVerdict {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn to_bits(self) -> u32 {
        self.0
    }

    pub fn in_dictionary(self) -> bool {
        self.0 & IN_DICTIONARY != 0
    }

    pub fn looks_like_typo(self) -> bool {
        self.0 & LOOKS_LIKE_TYPO != 0
    }

    pub fn has_recommended_suggestions(self) -> bool {
        self.0 & HAS_RECOMMENDED_SUGGESTIONS != 0
    }

    /// Structurally present but never set by this core; grammar checking
    /// is out of scope here and the bit exists only for forward
    /// compatibility with a caller that sets it itself.
    pub fn looks_like_grammar_error(self) -> bool {
        self.0 & LOOKS_LIKE_GRAMMAR_ERROR != 0
    }

    /// Structurally present but never set by this core, for the same
    /// reason as `looks_like_grammar_error`.
    pub fn dont_show_ui(self) -> bool {
        self.0 & DONT_SHOW_UI != 0
    }

    fn with_bit(mut self, bit: u32, value: bool) -> Self {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
        self
    }
}

/// Fixed candidate count requested from `suggest()` when falling back to a
/// typo search, independent of whatever count the caller's own flags asked
/// for.
const SPELLCHECK_SUGGESTION_COUNT: u8 = 5;

/// Checks `word` against the session's dictionaries. An exact dictionary
/// hit that passes `flags`' offensive/hidden gates short-circuits straight
/// to `IN_DICTIONARY` with no suggestion list. A hidden or offensive entry
/// typed exactly but not permitted by `flags` does not count as an exact
/// match and falls through to the typo-fallback lookup below (which
/// applies the same gates to its own candidates). Otherwise runs a bounded
/// fuzzy lookup and folds the result into a verdict plus the suggestion
/// strings themselves.
pub fn check(session: &Session, word: &str, flags: SuggestionRequestFlags) -> (SpellingVerdict, Vec<String>) {
    if word.is_empty() {
        return (SpellingVerdict::empty(), Vec::new());
    }

    if session.has_exact_gated_match(word, flags) {
        return (SpellingVerdict::empty().with_bit(IN_DICTIONARY, true), Vec::new());
    }

    let lookup_flags = flags
        .with_max_override(SPELLCHECK_SUGGESTION_COUNT)
        .with_input_shift_state_start(ShiftState::Unshifted)
        .with_input_shift_state_current(ShiftState::Unshifted);
    let suggestions = session.suggest(word, lookup_flags);

    let mut verdict = SpellingVerdict::empty();
    if !suggestions.is_empty() {
        verdict = verdict.with_bit(LOOKS_LIKE_TYPO, true).with_bit(HAS_RECOMMENDED_SUGGESTIONS, true);
    }

    let words = suggestions.into_iter().map(|c| c.text).collect();
    (verdict, words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dictionary::Dictionary;
    use crate::core::key_proximity::KeyProximityMap;
    use crate::core::types::Header;
    use crate::session::Session;

    fn session_with(words: &[(&str, u32)]) -> Session {
        let mut dict = Dictionary::new_empty(Header::new("base"), false);
        for (w, s) in words {
            dict.insert(w, *s, false, false).unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.txt");
        dict.persist_text(&path).unwrap();
        // leak the tempdir so the file outlives this function; tests are
        // short-lived processes so this is fine.
        std::mem::forget(dir);

        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&path).unwrap();
        session
    }

    #[test]
    fn exact_dictionary_word_short_circuits() {
        let session = session_with(&[("hello", 1000)]);
        let (verdict, suggestions) = check(&session, "hello", SuggestionRequestFlags::default());
        assert!(verdict.in_dictionary());
        assert!(!verdict.looks_like_typo());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn misspelling_flags_typo_with_suggestions() {
        let session = session_with(&[("hello", 1000)]);
        let (verdict, suggestions) = check(&session, "hallo", SuggestionRequestFlags::default());
        assert!(!verdict.in_dictionary());
        assert!(verdict.looks_like_typo());
        assert!(verdict.has_recommended_suggestions());
        assert!(suggestions.contains(&"hello".to_string()));
    }

    #[test]
    fn unrecognizable_word_has_no_suggestions_and_no_typo_flag() {
        let session = session_with(&[("hello", 1000)]);
        let (verdict, suggestions) = check(&session, "zzzzzzzzzz", SuggestionRequestFlags::default());
        assert!(!verdict.in_dictionary());
        assert!(!verdict.looks_like_typo());
        assert!(suggestions.is_empty());
    }

    fn session_with_hidden(word: &str) -> Session {
        let mut dict = Dictionary::new_empty(Header::new("base"), false);
        dict.insert(word, 1000, false, true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.txt");
        dict.persist_text(&path).unwrap();
        std::mem::forget(dir);

        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&path).unwrap();
        session
    }

    #[test]
    fn exact_match_on_hidden_word_does_not_short_circuit_without_override() {
        let session = session_with_hidden("secret");
        let (verdict, _) = check(&session, "secret", SuggestionRequestFlags::default());
        assert!(!verdict.in_dictionary());
    }

    #[test]
    fn exact_match_on_hidden_word_short_circuits_with_override() {
        let session = session_with_hidden("secret");
        let flags = SuggestionRequestFlags::default().with_override_hidden_flag(true);
        let (verdict, _) = check(&session, "secret", flags);
        assert!(verdict.in_dictionary());
    }
}
