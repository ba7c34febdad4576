//! Multi-dictionary aggregation: one or more read-only base dictionaries
//! plus at most one mutable user dictionary, merged into a single ranked
//! suggestion list per keystroke.

use std::path::Path;

use crate::core::dictionary::Dictionary;
use crate::core::key_proximity::KeyProximityMap;
use crate::core::types::{Header, SessionConfig, SuggestionRequestFlags};
use crate::error::CoreError;
use crate::fuzzy::{self, FuzzyMatch};
use crate::unicode::nfc_canonicalize;

/// One ranked candidate returned from [`Session::suggest`], already merged
/// across every dictionary that contributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCandidate {
    pub text: String,
    pub secondary_text: Option<String>,
    pub edit_distance: u32,
    pub confidence: f64,
    pub is_eligible_for_auto_commit: bool,
    pub is_eligible_for_user_removal: bool,
}

/// Auto-commit thresholds. Only the top-ranked candidate is ever eligible;
/// every other candidate in the list is forced ineligible regardless of how
/// close its own confidence/edit distance come to these bars.
const AUTO_COMMIT_CONFIDENCE: f64 = 0.5;
const AUTO_COMMIT_MAX_EDIT_DISTANCE: u32 = 1;

/// Owns the dictionary set and the shared tunables (proximity map, cost
/// constants) a suggestion request is evaluated against. Not `Clone`: the
/// user dictionary's in-memory trie is meant to be mutated in place and
/// persisted, not copied.
pub struct Session {
    base_dicts: Vec<Dictionary>,
    user_dict: Option<Dictionary>,
    proximity: KeyProximityMap,
    config: SessionConfig,
}

impl Session {
    pub fn new(proximity: KeyProximityMap, config: SessionConfig) -> Self {
        crate::unicode::icu_init();
        Self { base_dicts: Vec::new(), user_dict: None, proximity, config }
    }

    pub fn with_default_config(proximity: KeyProximityMap) -> Self {
        Self::new(proximity, SessionConfig::default())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Loads a read-only base dictionary from `path` (text or `.bin`
    /// dispatched by extension) and adds it to the session.
    pub fn load_base_dictionary(&mut self, path: &Path) -> Result<(), CoreError> {
        let dict = load_dictionary(path, false)?;
        tracing::debug!(
            path = %path.display(),
            words = dict.list_words().len(),
            "loaded base dictionary"
        );
        self.base_dicts.push(dict);
        Ok(())
    }

    /// Loads the single mutable user dictionary. Replaces any previously
    /// loaded one; a session holds at most one.
    pub fn load_user_dictionary(&mut self, path: &Path) -> Result<(), CoreError> {
        let dict = load_dictionary(path, true)?;
        tracing::debug!(
            path = %path.display(),
            words = dict.list_words().len(),
            "loaded user dictionary"
        );
        self.user_dict = Some(dict);
        Ok(())
    }

    /// Creates an empty, unbound user dictionary in memory, for sessions
    /// that learn from scratch without a pre-existing file on disk.
    pub fn new_user_dictionary(&mut self, name: impl Into<String>) {
        self.user_dict = Some(Dictionary::new_empty(Header::new(name), true));
    }

    pub fn user_dictionary(&self) -> Option<&Dictionary> {
        self.user_dict.as_ref()
    }

    pub fn user_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        self.user_dict.as_mut()
    }

    fn all_dicts(&self) -> impl Iterator<Item = &Dictionary> {
        self.base_dicts.iter().chain(self.user_dict.iter())
    }

    /// Runs fuzzy search against every loaded dictionary, merges results by
    /// NFC-canonicalized word identity (keeping the highest-confidence
    /// match per identity, annotating it with the runner-up's surface form
    /// as `secondary_text` when they render differently), truncates to the
    /// caller's requested count, and flags auto-commit/removal eligibility.
    pub fn suggest(&self, word: &str, flags: SuggestionRequestFlags) -> Vec<SuggestionCandidate> {
        let mut merged: std::collections::HashMap<String, FuzzyMatch> =
            std::collections::HashMap::new();
        let mut from_user: std::collections::HashSet<String> = std::collections::HashSet::new();

        for dict in self.all_dicts() {
            let matches = fuzzy::search_dictionary(
                dict.trie(),
                word,
                &self.proximity,
                dict.max_unigram_score(),
                flags,
                &self.config,
            );
            let is_user_dict = self.user_dict.as_ref().map(|u| std::ptr::eq(u, dict)).unwrap_or(false);
            for m in matches {
                let identity = nfc_canonicalize(&m.word.to_utf8_string());
                if is_user_dict {
                    from_user.insert(identity.clone());
                }
                merged
                    .entry(identity)
                    .and_modify(|existing| {
                        if m.confidence > existing.confidence
                            || (m.confidence == existing.confidence
                                && m.edit_distance < existing.edit_distance)
                        {
                            *existing = m.clone();
                        }
                    })
                    .or_insert(m);
            }
        }

        let mut results: Vec<FuzzyMatch> = merged.into_values().collect();
        fuzzy::sort_matches(&mut results);
        results.truncate(flags.max_suggestion_count().max(1) as usize);

        results
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                let text = m.word.to_utf8_string();
                let is_eligible_for_auto_commit = i == 0
                    && m.edit_distance <= AUTO_COMMIT_MAX_EDIT_DISTANCE
                    && m.confidence >= AUTO_COMMIT_CONFIDENCE;
                let is_eligible_for_user_removal =
                    from_user.contains(&nfc_canonicalize(&text)) && self.user_dict.is_some();
                SuggestionCandidate {
                    text,
                    secondary_text: None,
                    edit_distance: m.edit_distance,
                    confidence: m.confidence,
                    is_eligible_for_auto_commit,
                    is_eligible_for_user_removal,
                }
            })
            .collect()
    }

    /// All words across every dictionary, deduplicated by NFC identity,
    /// code-point-ascending within each dictionary's own contribution.
    pub fn get_list_of_words(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for dict in self.all_dicts() {
            for word in dict.list_words() {
                let identity = nfc_canonicalize(&word);
                if seen.insert(identity) {
                    out.push(word);
                }
            }
        }
        out
    }

    /// The highest frequency for `word` across every loaded dictionary, or
    /// 0.0 if it appears nowhere.
    pub fn get_frequency_for_word(&self, word: &str) -> f64 {
        self.all_dicts()
            .map(|d| d.frequency_for(word))
            .fold(0.0_f64, f64::max)
    }

    /// Whether `word` exists verbatim in any loaded dictionary and that
    /// entry passes `flags`' offensive/hidden gates. Unlike
    /// `get_list_of_words`/`get_frequency_for_word`, this is gate-aware, so
    /// a hidden or offensive entry found under a request that doesn't
    /// permit it does not count as an exact match.
    pub fn has_exact_gated_match(&self, word: &str, flags: SuggestionRequestFlags) -> bool {
        self.all_dicts()
            .filter_map(|d| d.find(word))
            .any(|entry| fuzzy::passes_gates(entry, flags))
    }

    /// Records that `word` was typed/accepted, incrementing its score in
    /// the user dictionary (creating it there if previously unseen). A
    /// no-op if no user dictionary is loaded.
    pub fn learn(&mut self, word: &str, delta_score: u32) -> Result<(), CoreError> {
        match self.user_dict.as_mut() {
            Some(dict) => crate::learning::increment_score(dict, word, delta_score),
            None => Ok(()),
        }
    }

    /// Writes the user dictionary back to its bound path, if any.
    pub fn persist_user_dictionary(&self) -> Result<(), CoreError> {
        match self.user_dict.as_ref() {
            Some(dict) if dict.source_path().is_some() => dict.persist(),
            _ => Ok(()),
        }
    }
}

fn load_dictionary(path: &Path, is_mutable: bool) -> Result<Dictionary, CoreError> {
    if path.extension().and_then(|e| e.to_str()) == Some("bin") {
        Dictionary::load_binary(path, is_mutable)
    } else {
        Dictionary::load_text(path, is_mutable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ShiftState;

    fn write_dict(dir: &std::path::Path, name: &str, words: &[(&str, u32)]) -> std::path::PathBuf {
        let mut dict = Dictionary::new_empty(Header::new(name), false);
        for (w, score) in words {
            dict.insert(w, *score, false, false).unwrap();
        }
        let path = dir.join(format!("{name}.txt"));
        dict.persist_text(&path).unwrap();
        path
    }

    fn flags() -> SuggestionRequestFlags {
        SuggestionRequestFlags::new(8).with_input_shift_state_start(ShiftState::Unshifted)
    }

    #[test]
    fn exact_match_wins_and_is_auto_commit_eligible() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dict(dir.path(), "base", &[("hello", 1000), ("help", 500)]);
        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&path).unwrap();

        let results = session.suggest("hello", flags());
        assert_eq!(results[0].text, "hello");
        assert_eq!(results[0].edit_distance, 0);
        assert!(results[0].is_eligible_for_auto_commit);
    }

    #[test]
    fn single_typo_with_sufficient_confidence_is_auto_commit_eligible() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = write_dict(dir.path(), "base", &[("hello", 1000)]);
        let proximity_path = dir.path().join("proximity.json");
        std::fs::File::create(&proximity_path)
            .unwrap()
            .write_all(br#"{"w": ["e"], "e": ["w"]}"#)
            .unwrap();
        let proximity = KeyProximityMap::load(&proximity_path).unwrap();

        let mut session = Session::with_default_config(proximity);
        session.load_base_dictionary(&path).unwrap();

        // "w" is a registered near-neighbor of "e", so this single
        // substitution costs C_sub_near (1) rather than C_sub_far.
        let results = session.suggest("hwllo", flags());
        assert_eq!(results[0].text, "hello");
        assert_eq!(results[0].edit_distance, 1);
        assert!(results[0].confidence >= 0.5);
        assert!(results[0].is_eligible_for_auto_commit);
    }

    #[test]
    fn only_the_top_ranked_candidate_can_be_auto_commit_eligible() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        // "hello" and "hillo" are each one near-substitution away from the
        // query "hallo" and carry equal scores, so both would individually
        // clear the auto-commit bar; only the rank-0 candidate after
        // tie-break ordering is allowed to be flagged.
        let path = write_dict(dir.path(), "base", &[("hello", 1000), ("hillo", 1000)]);
        let proximity_path = dir.path().join("proximity.json");
        std::fs::File::create(&proximity_path)
            .unwrap()
            .write_all(br#"{"a": ["e", "i"], "e": ["a"], "i": ["a"]}"#)
            .unwrap();
        let proximity = KeyProximityMap::load(&proximity_path).unwrap();

        let mut session = Session::with_default_config(proximity);
        session.load_base_dictionary(&path).unwrap();

        let results = session.suggest("hallo", flags());
        assert!(results.len() > 1);
        assert!(results.iter().all(|c| c.edit_distance <= 1 && c.confidence >= 0.5));
        assert!(results[0].is_eligible_for_auto_commit);
        assert!(results[1..].iter().all(|c| !c.is_eligible_for_auto_commit));
    }

    #[test]
    fn merges_duplicate_word_across_dictionaries_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = write_dict(dir.path(), "base", &[("cat", 100)]);
        let user_path = write_dict(dir.path(), "user", &[("cat", 50)]);

        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&base_path).unwrap();
        session.load_user_dictionary(&user_path).unwrap();

        let results = session.suggest("cat", flags());
        let cats: Vec<_> = results.iter().filter(|c| c.text == "cat").collect();
        assert_eq!(cats.len(), 1);
    }

    #[test]
    fn offensive_word_hidden_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut dict = Dictionary::new_empty(Header::new("base"), false);
        dict.insert("damn", 1000, true, false).unwrap();
        let path = dir.path().join("base.txt");
        dict.persist_text(&path).unwrap();

        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&path).unwrap();

        let hidden = session.suggest("damn", flags());
        assert!(hidden.is_empty());

        let shown = session.suggest("damn", flags().with_allow_possibly_offensive(true));
        assert_eq!(shown[0].text, "damn");
    }

    #[test]
    fn get_list_of_words_dedupes_across_dictionaries() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = write_dict(dir.path(), "base", &[("apple", 10), ("banana", 5)]);
        let user_path = write_dict(dir.path(), "user", &[("apple", 1), ("cherry", 1)]);

        let mut session = Session::with_default_config(KeyProximityMap::empty());
        session.load_base_dictionary(&base_path).unwrap();
        session.load_user_dictionary(&user_path).unwrap();

        let words = session.get_list_of_words();
        assert_eq!(words.iter().filter(|w| *w == "apple").count(), 1);
        assert!(words.contains(&"cherry".to_string()));
    }
}
