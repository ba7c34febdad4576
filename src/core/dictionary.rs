//! Trie owner + header + file I/O.
//!
//! This is a single `Dictionary` record with an `is_mutable` flag rather
//! than a read-only/mutable class split; mutation methods check the flag
//! and return `ImmutableDictionary` rather than being absent from the type.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::trie::Trie;
use crate::core::types::{Header, Score, WordEntry, SCORE_MAX};
use crate::error::CoreError;
use crate::persistence;
use crate::unicode::{UniString, NGRAM_SEPARATOR};

const SECTION_WORDS: &str = "[words]";
const SECTION_SHORTCUTS: &str = "[shortcuts]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Words,
    Shortcuts,
    Unknown,
}

/// Trie owner + header + cached maxima.
#[derive(Debug, Clone)]
pub struct Dictionary {
    trie: Trie,
    header: Header,
    max_unigram_score: Score,
    shortcuts: Vec<(String, String)>,
    is_mutable: bool,
    source_path: Option<PathBuf>,
}

/// Shape serialized by the optional binary form; round-trips bit-exact
/// with the text form at the `WordEntry` level.
#[derive(Serialize, Deserialize)]
struct BinarySnapshot {
    header: Header,
    is_mutable: bool,
    entries: Vec<(UniString, WordEntry)>,
    shortcuts: Vec<(String, String)>,
}

impl Dictionary {
    pub fn new_empty(header: Header, is_mutable: bool) -> Self {
        Self {
            trie: Trie::new(),
            header,
            max_unigram_score: 0,
            shortcuts: Vec::new(),
            is_mutable,
            source_path: None,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn is_mutable(&self) -> bool {
        self.is_mutable
    }

    pub fn max_unigram_score(&self) -> Score {
        self.max_unigram_score
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn find(&self, word: &str) -> Option<&WordEntry> {
        self.trie.find(&UniString::from(word))
    }

    /// All words carrying a live payload, in code-point-ascending order.
    pub fn list_words(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.trie.for_each(|prefix, _| out.push(prefix.to_utf8_string()));
        out
    }

    pub fn frequency_for(&self, word: &str) -> f64 {
        if self.max_unigram_score == 0 {
            return 0.0;
        }
        match self.find(word) {
            Some(entry) => entry.absolute_score as f64 / self.max_unigram_score as f64,
            None => 0.0,
        }
    }

    /// Inserts or updates `word`, incrementing its score by `delta_score`
    /// (saturating at `SCORE_MAX`). Rejects empty keys and keys containing
    /// the reserved n-gram separator.
    pub fn insert(
        &mut self,
        word: &str,
        delta_score: Score,
        is_possibly_offensive: bool,
        is_hidden_by_user: bool,
    ) -> Result<(), CoreError> {
        self.require_mutable()?;
        validate_word(word)?;
        let key = UniString::from(word);
        let entry = self.trie.insert(&key);
        entry.saturating_add_score(delta_score);
        entry.is_possibly_offensive = is_possibly_offensive;
        entry.is_hidden_by_user = is_hidden_by_user;
        let new_score = entry.absolute_score;
        self.max_unigram_score = self.max_unigram_score.max(new_score);
        Ok(())
    }

    pub fn remove(&mut self, word: &str) -> Result<bool, CoreError> {
        self.require_mutable()?;
        validate_word(word)?;
        let removed = self.trie.remove(&UniString::from(word));
        if removed {
            self.recompute_max_score();
        }
        Ok(removed)
    }

    /// Multiplies every score by one half (integer floor) and refreshes
    /// `max_unigram_score`. Invoked by [`crate::learning`] when any score
    /// would exceed `SCORE_MAX - 128`.
    pub fn halve_all_scores(&mut self) {
        let mut entries = Vec::new();
        self.trie.for_each(|prefix, entry| entries.push((prefix.clone(), *entry)));
        let mut max = 0;
        for (key, mut entry) in entries {
            entry.absolute_score /= 2;
            max = max.max(entry.absolute_score);
            *self.trie.find_mut(&key).expect("key just enumerated by for_each") = entry;
        }
        self.max_unigram_score = max;
    }

    /// Removes entries scoring below `threshold`. Invoked by the training
    /// tool, never automatically.
    pub fn prune(&mut self, threshold: Score) -> Result<usize, CoreError> {
        self.require_mutable()?;
        let mut to_remove = Vec::new();
        self.trie.for_each(|prefix, entry| {
            if entry.absolute_score < threshold {
                to_remove.push(prefix.clone());
            }
        });
        let count = to_remove.len();
        for key in &to_remove {
            self.trie.remove(key);
        }
        if count > 0 {
            self.recompute_max_score();
        }
        Ok(count)
    }

    fn recompute_max_score(&mut self) {
        let mut max = 0;
        self.trie.for_each(|_, entry| max = max.max(entry.absolute_score));
        self.max_unigram_score = max;
    }

    fn require_mutable(&self) -> Result<(), CoreError> {
        if self.is_mutable {
            Ok(())
        } else {
            Err(CoreError::ImmutableDictionary)
        }
    }

    /// Atomically persists this dictionary back to its bound source path,
    /// in whichever form (`.bin` vs. text) that path implies. This is I/O
    /// and must not be called from inside a `suggest` call; callers
    /// schedule it on idle.
    pub fn persist(&self) -> Result<(), CoreError> {
        let path = self
            .source_path
            .clone()
            .ok_or_else(|| CoreError::InvalidArgument("dictionary has no bound path".into()))?;
        let result = if is_binary_path(&path) {
            self.persist_binary(&path)
        } else {
            self.persist_text(&path)
        };
        if let Err(e) = &result {
            tracing::error!(path = %path.display(), error = %e, "failed to persist dictionary");
        }
        result
    }

    pub fn bind_path(&mut self, path: impl Into<PathBuf>) {
        self.source_path = Some(path.into());
    }

    // ---- text format ----

    pub fn load_text(path: &Path, is_mutable: bool) -> Result<Self, CoreError> {
        Self::load_text_inner(path, is_mutable).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to load text dictionary");
            e
        })
    }

    fn load_text_inner(path: &Path, is_mutable: bool) -> Result<Self, CoreError> {
        let text = persistence::read_to_string(path)?;
        let mut header = Header::new("");
        let mut trie = Trie::new();
        let mut shortcuts = Vec::new();
        let mut max_score: Score = 0;
        let mut section = Section::Header;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let line = raw_line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            if let Some(stripped) = section_header(line) {
                section = match stripped {
                    SECTION_WORDS => Section::Words,
                    SECTION_SHORTCUTS => Section::Shortcuts,
                    other => {
                        tracing::warn!(section = %other, "unknown dictionary section, ignoring");
                        Section::Unknown
                    }
                };
                continue;
            }

            match section {
                Section::Header => parse_header_line(&mut header, line, path, line_no)?,
                Section::Words => {
                    let (word, entry) = parse_word_line(line, path, line_no)?;
                    max_score = max_score.max(entry.absolute_score);
                    *trie.insert(&word) = entry;
                }
                Section::Shortcuts => {
                    shortcuts.push(parse_shortcut_line(line, path, line_no)?);
                }
                Section::Unknown => {}
            }
        }

        if header.schema.is_empty() {
            return Err(CoreError::schema(path, 1, "missing required 'schema' header"));
        }

        Ok(Dictionary {
            trie,
            header,
            max_unigram_score: max_score,
            shortcuts,
            is_mutable,
            source_path: Some(path.to_path_buf()),
        })
    }

    pub fn persist_text(&self, path: &Path) -> Result<(), CoreError> {
        let mut out = String::new();
        out.push_str(&format!("schema={}\n", self.header.schema));
        out.push_str(&format!("name={}\n", self.header.name));
        out.push_str(&format!("locales={}\n", self.header.locales.join(",")));
        out.push_str(&format!("generated_by={}\n", self.header.generated_by));
        out.push_str(SECTION_WORDS);
        out.push('\n');

        self.trie.for_each(|prefix, entry| {
            out.push_str(&prefix.to_utf8_string());
            out.push('\t');
            out.push_str(&entry.absolute_score.to_string());
            let flags = word_flags_string(entry);
            if !flags.is_empty() {
                out.push('\t');
                out.push_str(&flags);
            }
            out.push('\n');
        });

        if !self.shortcuts.is_empty() {
            out.push_str(SECTION_SHORTCUTS);
            out.push('\n');
            for (shortcut, expansion) in &self.shortcuts {
                out.push_str(shortcut);
                out.push('\t');
                out.push_str(expansion);
                out.push('\n');
            }
        }

        persistence::atomic_write(path, out.as_bytes())
    }

    // ---- binary format (optional) ----

    pub fn load_binary(path: &Path, is_mutable: bool) -> Result<Self, CoreError> {
        Self::load_binary_inner(path, is_mutable).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to load binary dictionary");
            e
        })
    }

    fn load_binary_inner(path: &Path, is_mutable: bool) -> Result<Self, CoreError> {
        let mut reader = persistence::open_buffered(path)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| CoreError::io(path, e))?;
        let snapshot: BinarySnapshot = bincode::deserialize(&bytes)?;

        let mut trie = Trie::new();
        let mut max_score = 0;
        for (key, entry) in snapshot.entries {
            max_score = max_score.max(entry.absolute_score);
            *trie.insert(&key) = entry;
        }

        Ok(Dictionary {
            trie,
            header: snapshot.header,
            max_unigram_score: max_score,
            shortcuts: snapshot.shortcuts,
            is_mutable,
            source_path: Some(path.to_path_buf()),
        })
    }

    pub fn persist_binary(&self, path: &Path) -> Result<(), CoreError> {
        let mut entries = Vec::new();
        self.trie.for_each(|prefix, entry| entries.push((prefix.clone(), *entry)));
        let snapshot = BinarySnapshot {
            header: self.header.clone(),
            is_mutable: self.is_mutable,
            entries,
            shortcuts: self.shortcuts.clone(),
        };
        let bytes = bincode::serialize(&snapshot)?;
        persistence::atomic_write(path, &bytes)
    }
}

fn is_binary_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("bin")
}

fn section_header(line: &str) -> Option<&str> {
    if line.starts_with('[') && line.ends_with(']') {
        Some(line)
    } else {
        None
    }
}

fn parse_header_line(
    header: &mut Header,
    line: &str,
    path: &Path,
    line_no: usize,
) -> Result<(), CoreError> {
    let Some((key, value)) = line.split_once('=') else {
        return Err(CoreError::schema(path, line_no, format!("malformed header line: {line}")));
    };
    let value = value.trim();
    match key.trim() {
        "schema" => header.schema = value.to_string(),
        "name" => header.name = value.to_string(),
        "locales" => {
            header.locales =
                value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        }
        "generated_by" => header.generated_by = value.to_string(),
        other => {
            tracing::warn!(key = %other, line = line_no, "unknown dictionary header key, ignoring");
        }
    }
    Ok(())
}

fn parse_word_line(
    line: &str,
    path: &Path,
    line_no: usize,
) -> Result<(UniString, WordEntry), CoreError> {
    let mut fields = line.split('\t');
    let word = fields
        .next()
        .filter(|w| !w.is_empty())
        .ok_or_else(|| CoreError::schema(path, line_no, "missing word field"))?;
    let score_field = fields
        .next()
        .ok_or_else(|| CoreError::schema(path, line_no, "missing score field"))?;
    let score: Score = score_field
        .parse()
        .map_err(|_| CoreError::schema(path, line_no, format!("invalid score: {score_field}")))?;
    if score > SCORE_MAX {
        return Err(CoreError::schema(path, line_no, format!("score {score} exceeds SCORE_MAX")));
    }

    let mut entry = WordEntry::new(score);
    if let Some(flags) = fields.next() {
        for c in flags.chars() {
            match c {
                'o' => entry.is_possibly_offensive = true,
                'h' => entry.is_hidden_by_user = true,
                _ => tracing::warn!(flag = %c, line = line_no, "unknown word flag, ignoring"),
            }
        }
    }

    validate_word(word)?;
    Ok((UniString::from(word), entry))
}

fn parse_shortcut_line(
    line: &str,
    path: &Path,
    line_no: usize,
) -> Result<(String, String), CoreError> {
    let (shortcut, expansion) = line
        .split_once('\t')
        .ok_or_else(|| CoreError::schema(path, line_no, "malformed shortcut line"))?;
    Ok((shortcut.to_string(), expansion.to_string()))
}

fn word_flags_string(entry: &WordEntry) -> String {
    let mut s = String::new();
    if entry.is_possibly_offensive {
        s.push('o');
    }
    if entry.is_hidden_by_user {
        s.push('h');
    }
    s
}

fn validate_word(word: &str) -> Result<(), CoreError> {
    if word.is_empty() {
        return Err(CoreError::InvalidArgument("word key is empty".into()));
    }
    if word.chars().any(|c| c as u32 == NGRAM_SEPARATOR) {
        return Err(CoreError::InvalidArgument(
            "word key contains reserved n-gram separator".into(),
        ));
    }
    Ok(())
}
