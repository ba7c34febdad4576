//! On-device dictionary and suggestion engine for a keyboard input method:
//! a trie-backed word store, weighted fuzzy search, multi-dictionary
//! session aggregation, and a spell-check policy layer on top.

pub mod core;
pub mod error;
pub mod fuzzy;
pub mod learning;
pub mod persistence;
pub mod session;
pub mod spellcheck;
pub mod unicode;

pub use crate::core::dictionary::Dictionary;
pub use crate::core::key_proximity::KeyProximityMap;
pub use crate::core::types::{
    Header, Score, SessionConfig, ShiftState, SuggestionRequestFlags, WordEntry, SCORE_MAX,
};
pub use crate::error::CoreError;
pub use crate::session::{Session, SuggestionCandidate};
pub use crate::spellcheck::SpellingVerdict;
