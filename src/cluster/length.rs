use hashbrown::HashMap as FastHashMap;

use crate::pattern::Pattern;
use crate::tree::PiecePatternTree;

use super::bag::{confused, PieceBag, LengthPieceBucket};
use super::error::ClusterResult;
use super::processor::ClusterProcessor;

/// Second stage for single-sub-piece pieces: groups by `piece_length` and
/// assigns an exact numeric-bound pattern (`[rule]{n}`) to buckets that
/// dominate their length class, forwarding the rest to Fuzzy.
#[derive(Debug, Default)]
pub struct LengthPatternCluster {
    buckets: FastHashMap<usize, LengthPieceBucket>,
    order: Vec<usize>,
}

impl LengthPatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag) {
        let length = bag.piece_length();
        if !self.buckets.contains_key(&length) {
            self.order.push(length);
            self.buckets.insert(length, LengthPieceBucket::new());
        }
        self.buckets
            .get_mut(&length)
            .unwrap()
            .add(bag)
            .expect("a length bucket groups pieces by length, not by literal piece");
    }

    fn total_count(&self) -> i64 {
        self.buckets.values().map(|b| b.count()).sum()
    }

    /// Whether this length bucket dominates its siblings enough to deserve
    /// an exact numeric-bound pattern in its own right.
    fn length_as_cluster(bucket: &LengthPieceBucket, threshold: i64) -> bool {
        if (bucket.len() as i64) >= threshold {
            return true;
        }
        let max = bucket.max_by_count().map(|b| b.count()).unwrap_or(0);
        confused(bucket.count(), max, threshold)
    }

    /// Cross-level visibility: per the explicit resolution for this
    /// strategy, a parent distribution is clusterable here precisely when
    /// it *is* confused, unlike `PiecePatternCluster::as_cluster`.
    pub fn as_cluster(&self, p_counter: &FastHashMap<String, i64>, threshold: i64) -> bool {
        let total: i64 = p_counter.values().sum();
        if total < threshold {
            return false;
        }
        let max_part = p_counter.values().copied().max().unwrap_or(0);
        confused(total, max_part, threshold)
    }

    #[tracing::instrument(level = "trace", skip(self, predecessor, tree))]
    pub fn cluster(
        &mut self,
        mut predecessor: Option<&mut ClusterProcessor>,
        tree: &mut PiecePatternTree,
        threshold: i64,
    ) -> ClusterResult<Vec<PieceBag>> {
        if (self.buckets.len() as i64) < threshold {
            let total = self.total_count();
            if total < threshold {
                return Ok(Vec::new());
            }
            let max_length = *self
                .order
                .iter()
                .max_by_key(|l| self.buckets[l].count())
                .expect("non-empty buckets");
            let max_count = self.buckets[&max_length].count();
            if !confused(total, max_count, threshold) {
                if Self::length_as_cluster(&self.buckets[&max_length], threshold) {
                    let rule_tag = self
                        .buckets
                        .get_mut(&max_length)
                        .unwrap()
                        .iter()
                        .next()
                        .map(|b| b.fuzzy_rule().to_string())
                        .unwrap_or_default();
                    let pattern = Pattern::numeric_bound(&rule_tag, max_length);
                    self.buckets[&max_length].set_pattern(tree, &pattern)?;
                }
                return Ok(Vec::new());
            }
        }

        let mut residue = Vec::new();

        for length in &self.order {
            let bucket = self.buckets.get_mut(length).unwrap();
            let eligible = Self::length_as_cluster(bucket, threshold);
            let p_counter = bucket.p_counter().clone();
            let seek = predecessor
                .as_mut()
                .map(|p| p.seek_cluster(&p_counter))
                .unwrap_or(false);

            if !eligible || !seek {
                for bag in bucket.iter() {
                    residue.push(bag.clone());
                }
            } else {
                let rule_tag = bucket
                    .iter()
                    .next()
                    .map(|b| b.fuzzy_rule().to_string())
                    .unwrap_or_default();
                let pattern = Pattern::numeric_bound(&rule_tag, *length);
                bucket.set_pattern(tree, &pattern)?;
                if let Some(p) = predecessor.as_mut() {
                    p.revise(&p_counter);
                }
            }
        }

        Ok(residue)
    }
}
