use hashbrown::HashMap as FastHashMap;

use crate::tree::{NodeId, PiecePatternTree};
use crate::url::UrlMeta;

use super::base::BasePatternCluster;
use super::error::ClusterResult;
use super::fuzzy::FuzzyPatternCluster;
use super::length::LengthPatternCluster;
use super::mixed::MixedPatternCluster;
use super::piece::{ForwardKind, PiecePatternCluster};

/// What bounds a processor tree's depth: a real URL (path/query/fragment,
/// where only the last path segment may trigger the last-dot split) or an
/// inner tree built over one piece's own sub-pieces (Base/Mixed recursing
/// into a piece's internal structure, which never triggers it).
#[derive(Debug, Clone)]
enum Scope {
    Url(UrlMeta),
    Inner { total_depth: usize },
}

/// Fixes the tree level a processor is responsible for, within whatever
/// scope bounds the tree's depth.
#[derive(Debug, Clone)]
pub struct MetaInfo {
    scope: Scope,
    pub current_level: usize,
}

impl MetaInfo {
    pub fn for_url(url_meta: UrlMeta) -> Self {
        Self {
            scope: Scope::Url(url_meta),
            current_level: 0,
        }
    }

    pub fn for_inner(total_depth: usize) -> Self {
        Self {
            scope: Scope::Inner { total_depth },
            current_level: 0,
        }
    }

    pub fn is_last_level(&self) -> bool {
        match &self.scope {
            Scope::Url(meta) => meta.depth() == self.current_level,
            Scope::Inner { total_depth } => *total_depth == self.current_level,
        }
    }

    pub fn is_last_path(&self) -> bool {
        match &self.scope {
            Scope::Url(meta) => meta.is_last_path(self.current_level),
            Scope::Inner { .. } => false,
        }
    }

    pub fn next_level(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            current_level: self.current_level + 1,
        }
    }
}

/// Owns one instance of each cluster strategy for a single tree level and
/// drives the cascade in order. Only `piece` and `length` need to stay alive
/// for a descendant's cross-level look-ahead (`seek_cluster`/`revise`):
/// Base, Mixed, LastDotSplitFuzzy and Fuzzy never override `as_cluster`
/// (it defaults to `false`), so nothing ever needs to query them after the
/// fact.
#[derive(Debug)]
pub struct ClusterProcessor {
    meta_info: MetaInfo,
    threshold: i64,
    piece: PiecePatternCluster,
    length: LengthPatternCluster,
}

impl ClusterProcessor {
    pub fn new(meta_info: MetaInfo, threshold: i64) -> Self {
        Self {
            meta_info,
            threshold,
            piece: PiecePatternCluster::new(),
            length: LengthPatternCluster::new(),
        }
    }

    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    pub fn add(&mut self, node: NodeId, tree: &PiecePatternTree) {
        self.piece.add(node, tree, self.threshold);
    }

    /// Returns true iff *any* strategy's `as_cluster` returns true for this
    /// parent counter — the cross-level look-ahead hook.
    pub fn seek_cluster(&self, p_counter: &FastHashMap<String, i64>) -> bool {
        self.piece.as_cluster(p_counter, self.threshold)
            || self.length.as_cluster(p_counter, self.threshold)
    }

    /// Subtracts `p_counter`'s counts from this processor's own piece bags.
    pub fn revise(&mut self, p_counter: &FastHashMap<String, i64>) {
        self.piece.revise(p_counter);
    }

    #[tracing::instrument(level = "debug", skip(self, tree, predecessor), fields(level = self.meta_info.current_level))]
    pub fn process(
        &mut self,
        tree: &mut PiecePatternTree,
        mut predecessor: Option<&mut ClusterProcessor>,
    ) -> ClusterResult<()> {
        let (forward, bags) = self
            .piece
            .cluster(predecessor.as_deref_mut(), tree, self.threshold)?;

        let mut fuzzy = FuzzyPatternCluster::new();

        match forward {
            ForwardKind::None => {}
            ForwardKind::Length => {
                for bag in bags {
                    self.length.add(bag);
                }
                let residue =
                    self.length
                        .cluster(predecessor.as_deref_mut(), tree, self.threshold)?;
                for bag in residue {
                    fuzzy.add(bag, self.threshold);
                }
            }
            ForwardKind::Base => {
                let mut base = BasePatternCluster::new();
                for bag in bags {
                    base.add(bag);
                }
                let base_residue = base.cluster(tree, self.threshold)?;

                let mut mixed = MixedPatternCluster::new();
                for bag in base_residue {
                    mixed.add(bag);
                }
                let mixed_residue = mixed.cluster(tree, self.threshold, self.meta_info.is_last_path())?;
                for bag in mixed_residue {
                    fuzzy.add(bag, self.threshold);
                }
            }
        }

        fuzzy.cluster(tree)?;

        if self.meta_info.is_last_level() {
            return Ok(());
        }

        let mut children = self.spawn_children(tree)?;
        for child in children.iter_mut() {
            child.process(tree, Some(self))?;
        }

        Ok(())
    }

    /// Partitions every node seen by this processor's piece bucket by its
    /// (now possibly reassigned) pattern, creating one child processor per
    /// distinct pattern and feeding it that node's tree children.
    fn spawn_children(&self, tree: &PiecePatternTree) -> ClusterResult<Vec<ClusterProcessor>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_pattern: FastHashMap<String, ClusterProcessor> = FastHashMap::new();

        for node_id in self.piece.iter_node_ids() {
            let node = tree.node(node_id);
            // The root sentinel never gets a pattern assigned; treat it as
            // its own singleton group so its real children all land in one
            // next-level processor.
            let pattern_key = if node.has_pattern() {
                node.pattern().as_str().to_string()
            } else {
                String::new()
            };

            if !by_pattern.contains_key(&pattern_key) {
                order.push(pattern_key.clone());
                by_pattern.insert(
                    pattern_key.clone(),
                    ClusterProcessor::new(self.meta_info.next_level(), self.threshold),
                );
            }
            let child = by_pattern.get_mut(&pattern_key).unwrap();
            for grandchild in node.iter_children() {
                child.add(grandchild, tree);
            }
        }

        Ok(order.into_iter().map(|k| by_pattern.remove(&k).unwrap()).collect())
    }
}
