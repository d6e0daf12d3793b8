//! Prefix tree over combo click sequences
//!
//! Rebuilt wholesale with every configuration snapshot; there is no removal.

use crate::core::types::{ClickType, ComboPattern};

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Indexed by `slot(click)`
    children: [Option<usize>; 2],
    is_combo: bool,
}

/// Arena-backed trie; node 0 is the root
#[derive(Debug, Clone)]
pub struct ComboTrie {
    nodes: Vec<TrieNode>,
    patterns: usize,
}

impl Default for ComboTrie {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(click: ClickType) -> usize {
    match click {
        ClickType::Primary => 0,
        ClickType::Secondary => 1,
    }
}

impl ComboTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            patterns: 0,
        }
    }

    pub fn insert(&mut self, pattern: &ComboPattern) {
        let mut node = 0;
        for &click in pattern.clicks() {
            node = match self.nodes[node].children[slot(click)] {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children[slot(click)] = Some(next);
                    next
                }
            };
        }
        if !self.nodes[node].is_combo {
            self.nodes[node].is_combo = true;
            self.patterns += 1;
        }
    }

    fn walk(&self, seq: &[ClickType]) -> Option<usize> {
        seq.iter()
            .try_fold(0, |node, &click| self.nodes[node].children[slot(click)])
    }

    /// True if some inserted pattern starts with `seq`
    pub fn is_potential_prefix(&self, seq: &[ClickType]) -> bool {
        if self.patterns == 0 {
            return false;
        }
        self.walk(seq).is_some()
    }

    /// True if `seq` is exactly an inserted pattern
    pub fn is_exact_match(&self, seq: &[ClickType]) -> bool {
        self.walk(seq).is_some_and(|node| self.nodes[node].is_combo)
    }

    /// Number of distinct patterns inserted
    pub fn len(&self) -> usize {
        self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }
}
