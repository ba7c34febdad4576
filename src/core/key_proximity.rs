//! Per-key adjacency set, loaded from a small JSON asset describing which
//! keys sit next to each other on the assumed keyboard layout.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::CoreError;
use crate::unicode::CodePoint;

/// Mapping from code point to the set of code points considered
/// "neighboring" on the assumed keyboard layout. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct KeyProximityMap {
    neighbors: HashMap<CodePoint, HashSet<CodePoint>>,
}

impl KeyProximityMap {
    pub fn empty() -> Self {
        Self { neighbors: HashMap::new() }
    }

    /// Loads `{ "a": ["s","q","w","z"], ... }`. Each key and value string
    /// must decode to exactly one code point; anything else is tolerated
    /// with a `tracing::warn!` and the offending entry/character dropped.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(&text)
            .map_err(|e| CoreError::schema(path, 0, format!("invalid proximity-map JSON: {e}")))?;

        let mut neighbors: HashMap<CodePoint, HashSet<CodePoint>> = HashMap::new();
        for (key, values) in raw {
            let Some(assumed) = single_code_point(&key) else {
                tracing::warn!(key = %key, "proximity map key is not a single character, ignoring");
                continue;
            };
            let set = neighbors.entry(assumed).or_default();
            for value in values {
                match single_code_point(&value) {
                    Some(cp) => {
                        set.insert(cp);
                    }
                    None => {
                        tracing::warn!(
                            key = %key, value = %value,
                            "proximity map value is not a single character, ignoring"
                        );
                    }
                }
            }
        }
        Ok(Self { neighbors })
    }

    /// O(1) expected.
    pub fn is_neighbor(&self, assumed: CodePoint, actual: CodePoint) -> bool {
        self.neighbors.get(&assumed).map(|set| set.contains(&actual)).unwrap_or(false)
    }
}

fn single_code_point(s: &str) -> Option<CodePoint> {
    let mut chars = s.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(first as CodePoint)
}
