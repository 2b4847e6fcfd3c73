use hashbrown::HashMap as FastHashMap;

use crate::tree::{NodeId, PiecePatternTree};

use super::error::{ClusterError, ClusterResult};

/// The central tie-breaker: is this bucket "ambiguous enough to keep
/// splitting"? True iff `total >= threshold` and either both `part` and the
/// complement are `>= threshold`, or the two sides are nearly balanced.
pub fn confused(total: i64, part: i64, threshold: i64) -> bool {
    if total < threshold {
        return false;
    }
    let other = total - part;
    if part >= threshold && other >= threshold {
        return true;
    }
    (part - other).abs() < threshold - 1
}

/// All tree nodes sharing one literal piece, plus the running count and the
/// multiset of parent pieces that led to members (used for cross-level
/// look-ahead).
#[derive(Debug, Clone)]
pub struct PieceBag {
    piece: String,
    piece_length: usize,
    fuzzy_rule: String,
    nodes: Vec<NodeId>,
    count: i64,
    p_counter: FastHashMap<String, i64>,
}

impl PieceBag {
    fn new(piece: String, piece_length: usize, fuzzy_rule: String) -> Self {
        Self {
            piece,
            piece_length,
            fuzzy_rule,
            nodes: Vec::new(),
            count: 0,
            p_counter: FastHashMap::new(),
        }
    }

    pub fn add(&mut self, node_id: NodeId, tree: &PiecePatternTree) {
        let node = tree.node(node_id);
        self.count += node.count as i64;
        if let Some(parent_id) = node.parent() {
            let parent_piece = tree.node(parent_id).piece().to_string();
            *self.p_counter.entry(parent_piece).or_insert(0) += node.count as i64;
        }
        self.nodes.push(node_id);
    }

    /// Cross-level count revision: subtracts `delta` from this bag's running
    /// count without touching the underlying tree nodes.
    pub fn incr(&mut self, delta: i64) {
        self.count += delta;
    }

    pub fn piece(&self) -> &str {
        &self.piece
    }

    pub fn piece_length(&self) -> usize {
        self.piece_length
    }

    pub fn fuzzy_rule(&self) -> &str {
        &self.fuzzy_rule
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn p_counter(&self) -> &FastHashMap<String, i64> {
        &self.p_counter
    }

    pub fn set_pattern(
        &self,
        tree: &mut PiecePatternTree,
        pattern: &crate::pattern::Pattern,
    ) -> ClusterResult<()> {
        for &id in &self.nodes {
            tree.node_mut(id).assign_pattern(pattern.clone())?;
        }
        Ok(())
    }
}

/// Insertion-preserving mapping from piece to `PieceBag`, with an aggregate
/// running count.
#[derive(Debug, Default)]
pub struct PieceBucket {
    keys: Vec<String>,
    bags: FastHashMap<String, PieceBag>,
    count: i64,
}

impl PieceBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node_id: NodeId, tree: &PiecePatternTree) {
        let node = tree.node(node_id);
        let piece = node.piece().to_string();
        let parsed = node
            .parsed_piece
            .as_ref()
            .expect("only non-root nodes are added to a piece bucket");

        if !self.bags.contains_key(&piece) {
            self.keys.push(piece.clone());
            self.bags.insert(
                piece.clone(),
                PieceBag::new(piece.clone(), parsed.piece_length, parsed.fuzzy_rule.clone()),
            );
        }
        self.count += node.count as i64;
        self.bags.get_mut(&piece).unwrap().add(node_id, tree);
    }

    pub fn get(&self, piece: &str) -> Option<&PieceBag> {
        self.bags.get(piece)
    }

    pub fn get_mut(&mut self, piece: &str) -> Option<&mut PieceBag> {
        self.bags.get_mut(piece)
    }

    pub fn contains(&self, piece: &str) -> bool {
        self.bags.contains_key(piece)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn iter(&self) -> impl Iterator<Item = &PieceBag> {
        self.keys.iter().map(move |k| &self.bags[k])
    }

    pub fn max_by_count(&self) -> Option<&PieceBag> {
        self.iter().max_by_key(|b| b.count())
    }
}

/// Groups `PieceBag`s that share one `piece_length`. Adding a bag whose
/// representative piece is already present is a programming error.
#[derive(Debug, Default)]
pub struct LengthPieceBucket {
    keys: Vec<String>,
    bags: FastHashMap<String, PieceBag>,
    count: i64,
    p_counter: Option<FastHashMap<String, i64>>,
}

impl LengthPieceBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag) -> ClusterResult<()> {
        let piece = bag.piece().to_string();
        if self.bags.contains_key(&piece) {
            return Err(ClusterError::DuplicatePiece { piece });
        }
        self.count += bag.count();
        self.keys.push(piece.clone());
        self.bags.insert(piece, bag);
        self.p_counter = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn iter(&self) -> impl Iterator<Item = &PieceBag> {
        self.keys.iter().map(move |k| &self.bags[k])
    }

    pub fn max_by_count(&self) -> Option<&PieceBag> {
        self.iter().max_by_key(|b| b.count())
    }

    /// The merged parent counter across every constituent bag, cached after
    /// first computation.
    pub fn p_counter(&mut self) -> &FastHashMap<String, i64> {
        if self.p_counter.is_none() {
            let mut merged: FastHashMap<String, i64> = FastHashMap::new();
            for bag in self.keys.iter().map(|k| &self.bags[k]) {
                for (k, v) in bag.p_counter() {
                    *merged.entry(k.clone()).or_insert(0) += v;
                }
            }
            self.p_counter = Some(merged);
        }
        self.p_counter.as_ref().unwrap()
    }

    pub fn set_pattern(
        &self,
        tree: &mut PiecePatternTree,
        pattern: &crate::pattern::Pattern,
    ) -> ClusterResult<()> {
        for bag in self.iter() {
            bag.set_pattern(tree, pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confused_requires_threshold_total() {
        assert!(!confused(2, 1, 3));
    }

    #[test]
    fn confused_true_when_both_sides_meet_threshold() {
        assert!(confused(10, 5, 3));
    }

    #[test]
    fn confused_true_when_nearly_balanced() {
        // total=6, part=3: other=3, |3-3| = 0 < threshold-1 = 2
        assert!(confused(6, 3, 3));
    }

    #[test]
    fn confused_false_when_one_side_dominates() {
        // total=6, part=6: other=0, neither >= threshold, |6-0|=6 not < 2
        assert!(!confused(6, 6, 3));
    }
}
