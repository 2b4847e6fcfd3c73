use hashbrown::HashMap as FastHashMap;

use crate::tree::PiecePatternTree;

use super::bag::{confused, PieceBag};
use super::base::{build_composite, structural_key};
use super::error::ClusterResult;
use super::last_dot::LastDotSplitFuzzyPatternCluster;

/// Residue from Base: pieces whose exact positional shape didn't have
/// enough volume on its own to clear the threshold. Mixed re-groups them by
/// `fuzzy_rule` alone (ignoring exact sub-piece count and lengths) to pool
/// enough volume across shapes, then re-splits each such pool back into its
/// exact shapes and rebuilds a composite per shape — the same
/// `Pattern::composite` machinery `Base` uses, just reached from a coarser
/// starting bucket, so fixed substrings stay literal and only genuinely
/// varying positions wildcard.
///
/// A shape that still won't compose (too sparse within its own pool, or the
/// inner recursive cascade doesn't converge on one pattern per position)
/// falls through to `LastDotSplitFuzzyPatternCluster` on the last path
/// segment, or further down to Fuzzy otherwise — Fuzzy, not Mixed, is where
/// a last-resort coarse wildcard gets built.
#[derive(Debug, Default)]
pub struct MixedPatternCluster {
    groups: FastHashMap<String, Vec<PieceBag>>,
    order: Vec<String>,
}

impl MixedPatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag) {
        let key = bag.fuzzy_rule().to_string();
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.groups.entry(key).or_default().push(bag);
    }

    #[tracing::instrument(level = "trace", skip(self, tree))]
    pub fn cluster(
        &mut self,
        tree: &mut PiecePatternTree,
        threshold: i64,
        is_last_path: bool,
    ) -> ClusterResult<Vec<PieceBag>> {
        let mut residue = Vec::new();
        let mut last_dot = LastDotSplitFuzzyPatternCluster::new();

        for key in self.order.drain(..) {
            let group = self.groups.remove(&key).unwrap();
            let total: i64 = group.iter().map(|b| b.count()).sum();
            let max = group.iter().map(|b| b.count()).max().unwrap_or(0);

            let leftover = if total >= threshold && confused(total, max, threshold) {
                compose_by_shape(tree, group, threshold)?
            } else {
                group
            };

            if is_last_path {
                for bag in leftover {
                    last_dot.add(bag);
                }
            } else {
                residue.extend(leftover);
            }
        }

        if is_last_path {
            residue.extend(last_dot.cluster(tree, threshold)?);
        }

        Ok(residue)
    }
}

/// Sub-buckets a fuzzy-rule pool by exact positional shape and rebuilds a
/// composite per shape via `base::build_composite`, trusting the pool-level
/// threshold/confused gate already passed by the caller rather than
/// re-applying it per shape (that's what let this pool clear the bar in the
/// first place, when no individual shape could on its own). A shape with
/// only one member can't show any fixed-vs-variable contrast and is left as
/// leftover untouched; a shape whose composite doesn't converge is also
/// returned as leftover for the caller to route further down the cascade.
fn compose_by_shape(tree: &mut PiecePatternTree, group: Vec<PieceBag>, threshold: i64) -> ClusterResult<Vec<PieceBag>> {
    let mut by_shape: FastHashMap<String, Vec<PieceBag>> = FastHashMap::new();
    let mut shape_order = Vec::new();
    for bag in group {
        let shape = structural_key(tree, &bag);
        if !by_shape.contains_key(&shape) {
            shape_order.push(shape.clone());
        }
        by_shape.entry(shape).or_default().push(bag);
    }

    let mut leftover = Vec::new();
    for shape in shape_order {
        let shaped = by_shape.remove(&shape).unwrap();
        if shaped.len() < 2 {
            leftover.extend(shaped);
            continue;
        }

        match build_composite(tree, &shaped, threshold)? {
            Some(pattern) => {
                for bag in &shaped {
                    bag.set_pattern(tree, &pattern)?;
                }
            }
            None => leftover.extend(shaped),
        }
    }

    Ok(leftover)
}
