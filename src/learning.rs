//! Score adjustment policy on top of a mutable [`Dictionary`]: increment on
//! confirmed use, decay before saturation, and pruning of words that fell
//! out of favor.

use crate::core::dictionary::Dictionary;
use crate::core::types::SCORE_MAX;
use crate::error::CoreError;

/// Headroom below `SCORE_MAX` that triggers a decay pass before adding more
/// score, so a word close to the ceiling doesn't just clip forever.
const DECAY_TRIGGER_HEADROOM: u32 = 128;

/// Records that `word` was typed/accepted, incrementing its score by
/// `delta_score`. If any score in the dictionary is already close enough to
/// `SCORE_MAX` that the increment could push it (or another word already at
/// the ceiling) into saturation, every word in the dictionary is halved
/// first so relative ranking among frequently-used words is preserved
/// instead of everything piling up at the ceiling.
pub fn increment_score(dict: &mut Dictionary, word: &str, delta_score: u32) -> Result<(), CoreError> {
    let max_score = dict.max_unigram_score();
    if max_score.saturating_add(delta_score) > SCORE_MAX - DECAY_TRIGGER_HEADROOM {
        tracing::debug!(word, max_score, delta_score, "score nearing ceiling, decaying dictionary");
        dict.halve_all_scores();
    }
    dict.insert(word, delta_score, false, false)
}

/// Halves every score in the dictionary unconditionally. Exposed for
/// callers that want to run decay on a schedule rather than relying on the
/// ceiling trigger in [`increment_score`].
pub fn adjust_scores(dict: &mut Dictionary) {
    tracing::debug!("running scheduled score decay");
    dict.halve_all_scores();
}

/// Removes every word scoring below `threshold`. Returns the number removed.
pub fn prune(dict: &mut Dictionary, threshold: u32) -> Result<usize, CoreError> {
    let removed = dict.prune(threshold)?;
    tracing::debug!(removed, threshold, "pruned low-score words");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Header;

    #[test]
    fn increment_creates_then_accumulates_score() {
        let mut dict = Dictionary::new_empty(Header::new("user"), true);
        increment_score(&mut dict, "hello", 10).unwrap();
        increment_score(&mut dict, "hello", 5).unwrap();
        assert_eq!(dict.find("hello").unwrap().absolute_score, 15);
    }

    #[test]
    fn increment_decays_before_saturating() {
        let mut dict = Dictionary::new_empty(Header::new("user"), true);
        dict.insert("hello", SCORE_MAX - 50, false, false).unwrap();
        dict.insert("world", 1000, false, false).unwrap();
        increment_score(&mut dict, "hello", 100).unwrap();
        assert!(dict.find("hello").unwrap().absolute_score < SCORE_MAX);
        assert_eq!(dict.find("world").unwrap().absolute_score, 500);
    }

    #[test]
    fn incrementing_an_unrelated_word_still_decays_when_another_word_is_near_ceiling() {
        let mut dict = Dictionary::new_empty(Header::new("user"), true);
        dict.insert("hello", SCORE_MAX - 50, false, false).unwrap();
        dict.insert("world", 10, false, false).unwrap();
        increment_score(&mut dict, "world", 5).unwrap();
        assert!(dict.find("hello").unwrap().absolute_score < SCORE_MAX - 50);
        assert_eq!(dict.find("world").unwrap().absolute_score, 5);
    }

    #[test]
    fn prune_removes_low_scoring_words() {
        let mut dict = Dictionary::new_empty(Header::new("user"), true);
        dict.insert("keep", 1000, false, false).unwrap();
        dict.insert("drop", 1, false, false).unwrap();
        let removed = prune(&mut dict, 10).unwrap();
        assert_eq!(removed, 1);
        assert!(dict.find("drop").is_none());
        assert!(dict.find("keep").is_some());
    }
}
