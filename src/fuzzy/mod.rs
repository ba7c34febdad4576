//! Weighted-DFS fuzzy search over a trie with a rolling edit-distance
//! frontier: a bounded DFS that prunes by a running best-so-far bound, using
//! a true weighted Damerau-Levenshtein frontier rather than a delete-set
//! lookup, since only a handful of candidates ever need ranking per
//! keystroke rather than a whole dictionary's worth of delete-set lookups.

use crate::core::key_proximity::KeyProximityMap;
use crate::core::trie::Trie;
use crate::core::types::{Score, SessionConfig, ShiftState, SuggestionRequestFlags, WordEntry};
use crate::unicode::{self, CodePoint, UniString};

/// One accepted candidate from a single dictionary's search, before the
/// session merges it with results from other dictionaries.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    pub word: UniString,
    pub edit_distance: u32,
    pub confidence: f64,
    pub entry: WordEntry,
}

/// Runs a bounded fuzzy search against a single trie, returning matches
/// ordered by confidence desc, edit distance asc, then code-point-ascending
/// word, so repeated queries against the same dictionary produce a stable
/// order.
pub fn search_dictionary(
    trie: &Trie,
    query_str: &str,
    proximity: &KeyProximityMap,
    max_unigram_score: Score,
    flags: SuggestionRequestFlags,
    cfg: &SessionConfig,
) -> Vec<FuzzyMatch> {
    let mut query = UniString::from(query_str);
    if query.is_empty() {
        return Vec::new();
    }
    query.truncate(cfg.max_query_len);

    let c_max = cfg.c_max_for(query.len());

    let mut variants = vec![query.clone()];
    if flags.input_shift_state_start() != ShiftState::Unshifted
        && query.as_slice().first().copied().map(unicode::is_lower).unwrap_or(false)
    {
        variants.push(unicode::title_case(&query));
    }
    if flags.input_shift_state_current() == ShiftState::CapsLock {
        variants.push(unicode::upper_case(&query));
    }

    let mut best: std::collections::HashMap<String, FuzzyMatch> = std::collections::HashMap::new();
    for variant in &variants {
        let ctx = SearchCtx {
            trie,
            query: variant.as_slice(),
            proximity,
            cfg,
            c_max,
            flags,
            max_unigram_score,
        };
        let mut found = Vec::new();
        let initial_row: Vec<u32> =
            (0..=ctx.query.len()).map(|i| i as u32 * cfg.c_ins).collect();
        let mut prefix = UniString::new();
        dfs(&ctx, trie.root_index(), &initial_row, None, None, &mut prefix, &mut found);

        for m in found {
            let key = m.word.to_utf8_string();
            best.entry(key)
                .and_modify(|existing| {
                    if m.edit_distance < existing.edit_distance {
                        *existing = m.clone();
                    }
                })
                .or_insert(m);
        }
    }

    let mut results: Vec<FuzzyMatch> = best.into_values().collect();
    sort_matches(&mut results);
    results
}

/// Sorts by confidence desc, edit distance asc, then code-point-ascending
/// word, breaking ties deterministically within a single dictionary.
pub fn sort_matches(matches: &mut [FuzzyMatch]) {
    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.edit_distance.cmp(&b.edit_distance))
            .then(a.word.as_slice().cmp(b.word.as_slice()))
    });
}

struct SearchCtx<'a> {
    trie: &'a Trie,
    query: &'a [CodePoint],
    proximity: &'a KeyProximityMap,
    cfg: &'a SessionConfig,
    c_max: u32,
    flags: SuggestionRequestFlags,
    max_unigram_score: Score,
}

fn dfs(
    ctx: &SearchCtx,
    node_idx: u32,
    row: &[u32],
    grand_row: Option<&[u32]>,
    prev_trie_char: Option<CodePoint>,
    prefix: &mut UniString,
    out: &mut Vec<FuzzyMatch>,
) {
    let q_len = ctx.query.len();

    for (c, child_idx) in ctx.trie.children_sorted(node_idx) {
        let mut new_row = vec![0u32; q_len + 1];
        new_row[0] = row[0] + ctx.cfg.c_del;

        for i in 1..=q_len {
            let match_cost = if c == ctx.query[i - 1] {
                0
            } else if ctx.proximity.is_neighbor(ctx.query[i - 1], c) {
                ctx.cfg.c_sub_near
            } else {
                ctx.cfg.c_sub_far
            };

            let mut best = (row[i - 1] + match_cost)
                .min(new_row[i - 1] + ctx.cfg.c_ins)
                .min(row[i] + ctx.cfg.c_del);

            if i >= 2 {
                if let Some(grand_row) = grand_row {
                    if ctx.query[i - 2] == c && prev_trie_char == Some(ctx.query[i - 1]) {
                        best = best.min(grand_row[i - 2] + ctx.cfg.c_trans);
                    }
                }
            }

            new_row[i] = best;
        }

        if *new_row.iter().min().unwrap() > ctx.c_max {
            tracing::trace!(char = %c, prefix = %prefix, "pruning branch, row exceeds c_max");
            continue;
        }

        prefix.push(c);

        let child = ctx.trie.node(child_idx);
        if child.is_terminal() {
            if let Some(entry) = child.payload() {
                let edit_distance = new_row[q_len];
                if edit_distance <= ctx.c_max && passes_gates(entry, ctx.flags) {
                    let normalized_score = if ctx.max_unigram_score == 0 {
                        0.0
                    } else {
                        entry.absolute_score as f64 / ctx.max_unigram_score as f64
                    };
                    let confidence = (normalized_score
                        * (1.0 - edit_distance as f64 / (ctx.c_max as f64 + 1.0)))
                        .clamp(0.0, 0.9);

                    out.push(FuzzyMatch {
                        word: prefix.clone(),
                        edit_distance,
                        confidence,
                        entry: *entry,
                    });
                }
            }
        }

        dfs(ctx, child_idx, &new_row, Some(row), Some(c), prefix, out);
        prefix.pop();
    }
}

pub(crate) fn passes_gates(entry: &WordEntry, flags: SuggestionRequestFlags) -> bool {
    if entry.is_hidden_by_user && !flags.override_hidden_flag() {
        return false;
    }
    if entry.is_possibly_offensive && !flags.allow_possibly_offensive() {
        return false;
    }
    true
}
