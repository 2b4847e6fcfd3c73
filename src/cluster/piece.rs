use hashbrown::HashMap as FastHashMap;

use crate::tree::{NodeId, PiecePatternTree};

use super::bag::{confused, PieceBag, PieceBucket};
use super::error::ClusterResult;
use super::processor::ClusterProcessor;

/// Which strategy a piece bucket's residue should be handed to next, decided
/// once per cascade from a single representative member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardKind {
    None,
    Length,
    Base,
}

/// First stage of the cascade: groups tree nodes by their literal piece and
/// decides, per piece, whether to leave it alone, hand it down to
/// Length/Base, or fold it into the predecessor's counts via `revise`.
#[derive(Debug, Default)]
pub struct PiecePatternCluster {
    piece_bucket: PieceBucket,
    piece_skip: FastHashMap<String, bool>,
}

impl PiecePatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeId, tree: &PiecePatternTree, _threshold: i64) {
        self.piece_bucket.add(node, tree);
    }

    pub fn iter_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.piece_bucket.iter().flat_map(|bag| bag.nodes().iter().copied())
    }

    /// A parent distribution looks "already settled" to this strategy when
    /// it is *not* confused — i.e. one piece clearly dominates, so there is
    /// nothing left here worth revising.
    pub fn as_cluster(&self, p_counter: &FastHashMap<String, i64>, threshold: i64) -> bool {
        let total: i64 = p_counter.values().sum();
        if total < threshold {
            return false;
        }
        let max_part = p_counter.values().copied().max().unwrap_or(0);
        !confused(total, max_part, threshold)
    }

    pub fn revise(&mut self, p_counter: &FastHashMap<String, i64>) {
        for (piece, delta) in p_counter {
            if let Some(bag) = self.piece_bucket.get_mut(piece) {
                bag.incr(-delta);
            }
        }
    }

    fn forward_kind(&self, tree: &PiecePatternTree) -> ForwardKind {
        match self.piece_bucket.iter().next() {
            None => ForwardKind::None,
            Some(bag) => {
                let node = tree.node(bag.nodes()[0]);
                let parsed = node
                    .parsed_piece
                    .as_ref()
                    .expect("only non-root nodes are added to a piece bucket");
                if parsed.pieces.len() > 1 {
                    ForwardKind::Base
                } else {
                    ForwardKind::Length
                }
            }
        }
    }

    #[tracing::instrument(level = "trace", skip(self, predecessor, tree))]
    pub fn cluster(
        &mut self,
        mut predecessor: Option<&mut ClusterProcessor>,
        tree: &mut PiecePatternTree,
        threshold: i64,
    ) -> ClusterResult<(ForwardKind, Vec<PieceBag>)> {
        if (self.piece_bucket.len() as i64) < threshold {
            if self.piece_bucket.count() < threshold {
                return Ok((ForwardKind::None, Vec::new()));
            }
            let max_bag = self.piece_bucket.max_by_count().expect("non-empty bucket");
            if !confused(self.piece_bucket.count(), max_bag.count(), threshold) {
                return Ok((ForwardKind::None, Vec::new()));
            }
        }

        let forward_kind = self.forward_kind(tree);
        let mut forwarded = Vec::new();

        for bag in self.piece_bucket.iter() {
            let skip = *self.piece_skip.get(bag.piece()).unwrap_or(&false);
            let below_threshold = bag.count() < threshold;
            let seek = predecessor
                .as_mut()
                .map(|p| p.seek_cluster(bag.p_counter()))
                .unwrap_or(false);

            if skip || below_threshold || !seek {
                forwarded.push(bag.clone());
            } else if let Some(p) = predecessor.as_mut() {
                p.revise(bag.p_counter());
            }
        }

        Ok((forward_kind, forwarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceParser;

    fn add_piece(cluster: &mut PiecePatternCluster, tree: &mut PiecePatternTree, piece: &str, count: u64) {
        let parsed = PieceParser::parse(piece).unwrap();
        tree.add_parsed_pieces(&[parsed], count).unwrap();
        let root = tree.root();
        let child = tree.node(root).find_child(piece).unwrap();
        cluster.add(child, tree, 1);
    }

    #[test]
    fn does_nothing_below_threshold() {
        let mut tree = PiecePatternTree::new();
        let mut cluster = PiecePatternCluster::new();
        add_piece(&mut cluster, &mut tree, "a", 1);

        let (forward, bags) = cluster.cluster(None, &mut tree, 3).unwrap();
        assert_eq!(forward, ForwardKind::None);
        assert!(bags.is_empty());
    }

    #[test]
    fn forwards_to_length_for_single_piece_pieces() {
        let mut tree = PiecePatternTree::new();
        let mut cluster = PiecePatternCluster::new();
        add_piece(&mut cluster, &mut tree, "1", 2);
        add_piece(&mut cluster, &mut tree, "2", 2);
        add_piece(&mut cluster, &mut tree, "3", 2);

        let (forward, bags) = cluster.cluster(None, &mut tree, 3).unwrap();
        assert_eq!(forward, ForwardKind::Length);
        assert_eq!(bags.len(), 3);
    }
}
