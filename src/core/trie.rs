//! Ordered-branch trie over code points, arena-backed: an arena of nodes
//! with integer child indices rather than a pointer-per-child tree, for
//! cache locality and a borrow-checker-friendly iterative insert. Children
//! of a node are kept in code-point-ascending order so `for_each` needs no
//! extra sort.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::WordEntry;
use crate::unicode::{CodePoint, UniString};

const ROOT: u32 = 0;

/// A node's branch table. Small node fan-out (the common case for a word
/// trie) uses a sorted vector so `for_each` needs no extra sort; nodes whose
/// fan-out exceeds `branch_vec_threshold` switch to a hash map for O(1)
/// descent and pay a one-time sort cost only when iterated.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Branches {
    Small(Vec<(CodePoint, u32)>),
    Large(HashMap<CodePoint, u32>),
}

impl Branches {
    fn get(&self, cp: CodePoint) -> Option<u32> {
        match self {
            Branches::Small(v) => v.iter().find(|&&(k, _)| k == cp).map(|&(_, idx)| idx),
            Branches::Large(m) => m.get(&cp).copied(),
        }
    }

    fn insert(&mut self, cp: CodePoint, idx: u32, threshold: usize) {
        match self {
            Branches::Small(v) => {
                match v.binary_search_by_key(&cp, |&(k, _)| k) {
                    Ok(pos) => v[pos].1 = idx,
                    Err(pos) => v.insert(pos, (cp, idx)),
                }
                if v.len() > threshold {
                    let map = v.iter().copied().collect();
                    *self = Branches::Large(map);
                }
            }
            Branches::Large(m) => {
                m.insert(cp, idx);
            }
        }
    }

    fn sorted_entries(&self) -> Vec<(CodePoint, u32)> {
        match self {
            Branches::Small(v) => v.clone(),
            Branches::Large(m) => {
                let mut v: Vec<_> = m.iter().map(|(&k, &idx)| (k, idx)).collect();
                v.sort_unstable_by_key(|&(k, _)| k);
                v
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieNode {
    branches: Branches,
    payload: Option<WordEntry>,
    is_terminal: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self { branches: Branches::Small(Vec::new()), payload: None, is_terminal: false }
    }

    pub fn payload(&self) -> Option<&WordEntry> {
        self.payload.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}

/// An arena-backed trie over `UniString` keys. Each trie owns its node
/// graph exclusively; there is no sharing between tries, and every node
/// except the root has exactly one parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    branch_vec_threshold: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::with_branch_threshold(8)
    }

    pub fn with_branch_threshold(branch_vec_threshold: usize) -> Self {
        Self { nodes: vec![TrieNode::new()], branch_vec_threshold }
    }

    pub fn root_payload(&self) -> Option<&WordEntry> {
        self.nodes[ROOT as usize].payload()
    }

    /// Resolves or creates the path for `key`, marks its terminal, and
    /// returns a mutable reference to the entry. Idempotent on key; existing
    /// scores are preserved if a payload is already present.
    ///
    /// An empty key targets the root's payload slot directly, creating one
    /// with score 0 if absent.
    pub fn insert(&mut self, key: &UniString) -> &mut WordEntry {
        let mut node_idx = ROOT;
        for &cp in key.as_slice() {
            node_idx = self.child_or_create(node_idx, cp);
        }
        let node = &mut self.nodes[node_idx as usize];
        node.is_terminal = true;
        node.payload.get_or_insert_with(|| WordEntry::new(0))
    }

    fn child_or_create(&mut self, node_idx: u32, cp: CodePoint) -> u32 {
        if let Some(existing) = self.nodes[node_idx as usize].branches.get(cp) {
            return existing;
        }
        let new_idx = self.nodes.len() as u32;
        self.nodes.push(TrieNode::new());
        self.nodes[node_idx as usize].branches.insert(cp, new_idx, self.branch_vec_threshold);
        new_idx
    }

    /// Returns the path's node index if it exists, without regard to
    /// terminal/payload state.
    fn follow(&self, key: &[CodePoint]) -> Option<u32> {
        let mut node_idx = ROOT;
        for &cp in key {
            node_idx = self.nodes[node_idx as usize].branches.get(cp)?;
        }
        Some(node_idx)
    }

    pub fn find(&self, key: &UniString) -> Option<&WordEntry> {
        let idx = self.follow(key.as_slice())?;
        let node = &self.nodes[idx as usize];
        if node.is_terminal {
            node.payload.as_ref()
        } else {
            None
        }
    }

    pub fn find_mut(&mut self, key: &UniString) -> Option<&mut WordEntry> {
        let idx = self.follow(key.as_slice())?;
        let node = &mut self.nodes[idx as usize];
        if node.is_terminal {
            node.payload.as_mut()
        } else {
            None
        }
    }

    /// Clears the terminal flag and payload at the leaf. Does not prune
    /// intermediate nodes, which may be shared prefixes of other words.
    pub fn remove(&mut self, key: &UniString) -> bool {
        match self.follow(key.as_slice()) {
            Some(idx) => {
                let node = &mut self.nodes[idx as usize];
                let existed = node.is_terminal;
                node.is_terminal = false;
                node.payload = None;
                existed
            }
            None => false,
        }
    }

    /// Node arena access for the fuzzy search DFS, which needs direct index
    /// traversal rather than key-based lookup.
    pub(crate) fn node(&self, idx: u32) -> &TrieNode {
        &self.nodes[idx as usize]
    }

    pub(crate) fn root_index(&self) -> u32 {
        ROOT
    }

    pub(crate) fn children_sorted(&self, idx: u32) -> Vec<(CodePoint, u32)> {
        self.nodes[idx as usize].branches.sorted_entries()
    }

    /// Streams `(prefix, &WordEntry)` pairs for every terminal node with a
    /// payload, in code-point-ascending DFS order. The prefix is rebuilt
    /// incrementally on a single reusable buffer.
    pub fn for_each(&self, mut visitor: impl FnMut(&UniString, &WordEntry)) {
        let mut prefix = UniString::new();
        self.walk(ROOT, &mut prefix, &mut visitor);
    }

    fn walk(
        &self,
        node_idx: u32,
        prefix: &mut UniString,
        visitor: &mut impl FnMut(&UniString, &WordEntry),
    ) {
        let node = &self.nodes[node_idx as usize];
        if node.is_terminal {
            if let Some(entry) = &node.payload {
                visitor(prefix, entry);
            }
        }
        for (cp, child_idx) in node.branches.sorted_entries() {
            prefix.push(cp);
            self.walk(child_idx, prefix, visitor);
            prefix.pop();
        }
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> UniString {
        UniString::from(s)
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut trie = Trie::new();
        trie.insert(&key("hello")).absolute_score = 100;
        assert_eq!(trie.find(&key("hello")).unwrap().absolute_score, 100);
        assert!(trie.find(&key("hell")).is_none());
    }

    #[test]
    fn insert_is_idempotent_preserving_score() {
        let mut trie = Trie::new();
        trie.insert(&key("cat")).absolute_score = 10;
        trie.insert(&key("cat")).absolute_score += 5;
        assert_eq!(trie.find(&key("cat")).unwrap().absolute_score, 15);
    }

    #[test]
    fn remove_clears_payload_but_keeps_shared_prefix() {
        let mut trie = Trie::new();
        trie.insert(&key("car"));
        trie.insert(&key("cart"));
        assert!(trie.remove(&key("car")));
        assert!(trie.find(&key("car")).is_none());
        assert!(trie.find(&key("cart")).is_some());
    }

    #[test]
    fn for_each_yields_code_point_ascending_order() {
        let mut trie = Trie::new();
        for w in ["banana", "apple", "apricot", "band"] {
            trie.insert(&key(w));
        }
        let mut seen = Vec::new();
        trie.for_each(|prefix, _| seen.push(prefix.to_utf8_string()));
        assert_eq!(seen, vec!["apple", "apricot", "banana", "band"]);
    }

    #[test]
    fn empty_key_insert_targets_root_payload() {
        let mut trie = Trie::new();
        trie.insert(&key("")).absolute_score = 1;
        assert_eq!(trie.root_payload().unwrap().absolute_score, 1);
    }

    #[test]
    fn large_branch_factor_still_iterates_sorted() {
        let mut trie = Trie::with_branch_threshold(2);
        for c in "zyxwvutsrqponmlkjihgfedcba".chars() {
            trie.insert(&UniString::from_code_points(vec![c as u32]));
        }
        let mut seen = Vec::new();
        trie.for_each(|prefix, _| seen.push(prefix.to_utf8_string()));
        let mut expected: Vec<String> =
            "abcdefghijklmnopqrstuvwxyz".chars().map(|c| c.to_string()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn separator_code_point_is_a_valid_branch_key() {
        use crate::unicode::NGRAM_SEPARATOR;
        let mut trie = Trie::new();
        let mut k = key("cat");
        k.push(NGRAM_SEPARATOR);
        k.push('s' as u32);
        trie.insert(&k).absolute_score = 1;
        assert!(trie.find(&k).is_some());
    }
}
