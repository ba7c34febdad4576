//! Score, word payload, dictionary header, and request-flag types.

use serde::{Deserialize, Serialize};

/// A non-negative learned/imported weight. The high byte is reserved so the
/// value stays within a signed 32-bit range on platforms that box it that way.
pub type Score = u32;

/// `2^24 - 1`, the ceiling a word's absolute score saturates at.
pub const SCORE_MAX: Score = (1 << 24) - 1;

/// Payload carried by a terminal trie node.
///
/// A node "is a word" iff its payload is present and either
/// `absolute_score > 0` or it was inserted explicitly (score 0 is legal for a
/// word whose score decayed to zero; its payload is retained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub absolute_score: Score,
    pub is_possibly_offensive: bool,
    pub is_hidden_by_user: bool,
}

impl WordEntry {
    pub fn new(absolute_score: Score) -> Self {
        Self { absolute_score, is_possibly_offensive: false, is_hidden_by_user: false }
    }

    pub fn saturating_add_score(&mut self, delta: Score) {
        self.absolute_score = self.absolute_score.saturating_add(delta).min(SCORE_MAX);
    }
}

/// Dictionary file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub schema: String,
    pub name: String,
    pub locales: Vec<String>,
    pub generated_by: String,
}

/// The canonical schema URL this core writes and accepts.
pub const CANONICAL_SCHEMA: &str =
    "https://florisboard.org/schemas/fldic/v0~draft1/dictionary.txt";

impl Header {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: CANONICAL_SCHEMA.to_string(),
            name: name.into(),
            locales: Vec::new(),
            generated_by: "fldic_core".to_string(),
        }
    }
}

/// Keyboard case/shift condition, used as a case-folding hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShiftState {
    Unshifted = 0,
    ShiftedManual = 1,
    ShiftedAutomatic = 2,
    CapsLock = 3,
}

impl ShiftState {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            1 => ShiftState::ShiftedManual,
            2 => ShiftState::ShiftedAutomatic,
            3 => ShiftState::CapsLock,
            _ => ShiftState::Unshifted,
        }
    }

    fn to_bits(self) -> u32 {
        self as u32
    }
}

/// Packed 32-bit request word:
/// bits 0-7: max_suggestion_count (1..255), bit 8: allow_possibly_offensive,
/// bit 9: is_private_session, bit 10: override_hidden_flag,
/// bits 12-13: input_shift_state_start, bits 14-15: input_shift_state_current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionRequestFlags(u32);

const MAX_COUNT_MASK: u32 = 0xFF;
const ALLOW_OFFENSIVE_BIT: u32 = 1 << 8;
const PRIVATE_SESSION_BIT: u32 = 1 << 9;
const OVERRIDE_HIDDEN_BIT: u32 = 1 << 10;
const SHIFT_START_SHIFT: u32 = 12;
const SHIFT_CURRENT_SHIFT: u32 = 14;

impl SuggestionRequestFlags {
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn to_bits(self) -> u32 {
        self.0
    }

    pub fn new(max_suggestion_count: u8) -> Self {
        Self(max_suggestion_count.max(1) as u32)
    }

    pub fn max_suggestion_count(self) -> u8 {
        (self.0 & MAX_COUNT_MASK) as u8
    }

    pub fn with_max_suggestion_count(mut self, count: u8) -> Self {
        self.0 = (self.0 & !MAX_COUNT_MASK) | count as u32;
        self
    }

    pub fn allow_possibly_offensive(self) -> bool {
        self.0 & ALLOW_OFFENSIVE_BIT != 0
    }

    pub fn with_allow_possibly_offensive(mut self, allow: bool) -> Self {
        self.set_bit(ALLOW_OFFENSIVE_BIT, allow);
        self
    }

    pub fn is_private_session(self) -> bool {
        self.0 & PRIVATE_SESSION_BIT != 0
    }

    pub fn with_private_session(mut self, private: bool) -> Self {
        self.set_bit(PRIVATE_SESSION_BIT, private);
        self
    }

    pub fn override_hidden_flag(self) -> bool {
        self.0 & OVERRIDE_HIDDEN_BIT != 0
    }

    pub fn with_override_hidden_flag(mut self, override_hidden: bool) -> Self {
        self.set_bit(OVERRIDE_HIDDEN_BIT, override_hidden);
        self
    }

    pub fn input_shift_state_start(self) -> ShiftState {
        ShiftState::from_bits(self.0 >> SHIFT_START_SHIFT)
    }

    pub fn with_input_shift_state_start(mut self, state: ShiftState) -> Self {
        self.0 = (self.0 & !(0b11 << SHIFT_START_SHIFT)) | (state.to_bits() << SHIFT_START_SHIFT);
        self
    }

    pub fn input_shift_state_current(self) -> ShiftState {
        ShiftState::from_bits(self.0 >> SHIFT_CURRENT_SHIFT)
    }

    pub fn with_input_shift_state_current(mut self, state: ShiftState) -> Self {
        self.0 =
            (self.0 & !(0b11 << SHIFT_CURRENT_SHIFT)) | (state.to_bits() << SHIFT_CURRENT_SHIFT);
        self
    }

    fn set_bit(&mut self, bit: u32, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    /// Returns a copy of these flags with `max_suggestion_count` overridden,
    /// used by `spell()` to request a fixed candidate count regardless of
    /// the caller's original count.
    pub fn with_max_override(self, count: u8) -> Self {
        self.with_max_suggestion_count(count)
    }
}

impl Default for SuggestionRequestFlags {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Tunable cost constants and ceilings for the fuzzy search engine, exposed
/// as a distinct type so its defaults are configurable without touching
/// engine code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub c_ins: u32,
    pub c_del: u32,
    pub c_sub_far: u32,
    pub c_sub_near: u32,
    pub c_trans: u32,
    pub c_max_ceiling: u32,
    /// Branching factor above which a trie node switches its child table
    /// from a sorted vector to a hash map.
    pub branch_vec_threshold: usize,
    /// Code points beyond which an input word is truncated before search.
    pub max_query_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            c_ins: 2,
            c_del: 2,
            c_sub_far: 2,
            c_sub_near: 1,
            c_trans: 1,
            c_max_ceiling: 8,
            branch_vec_threshold: 8,
            max_query_len: 48,
        }
    }
}

impl SessionConfig {
    pub fn c_max_for(&self, query_len: usize) -> u32 {
        (query_len.max(2) as u32).min(self.c_max_ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_through_bits() {
        let flags = SuggestionRequestFlags::new(5)
            .with_allow_possibly_offensive(true)
            .with_override_hidden_flag(true)
            .with_input_shift_state_start(ShiftState::ShiftedManual)
            .with_input_shift_state_current(ShiftState::CapsLock);

        let restored = SuggestionRequestFlags::from_bits(flags.to_bits());
        assert_eq!(restored.max_suggestion_count(), 5);
        assert!(restored.allow_possibly_offensive());
        assert!(!restored.is_private_session());
        assert!(restored.override_hidden_flag());
        assert_eq!(restored.input_shift_state_start(), ShiftState::ShiftedManual);
        assert_eq!(restored.input_shift_state_current(), ShiftState::CapsLock);
    }

    #[test]
    fn score_saturates_at_max() {
        let mut entry = WordEntry::new(SCORE_MAX - 5);
        entry.saturating_add_score(100);
        assert_eq!(entry.absolute_score, SCORE_MAX);
    }

    #[test]
    fn c_max_is_clamped_between_floor_and_ceiling() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.c_max_for(0), 2);
        assert_eq!(cfg.c_max_for(1), 2);
        assert_eq!(cfg.c_max_for(5), 5);
        assert_eq!(cfg.c_max_for(100), 8);
    }
}
