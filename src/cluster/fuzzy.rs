use crate::pattern::Pattern;
use crate::tree::PiecePatternTree;

use super::bag::{confused, PieceBag};
use super::error::ClusterResult;

/// The sink at the end of every cascade path. Accepts whatever Length,
/// Mixed, and LastDotSplitFuzzy couldn't place, and collapses the whole lot
/// to a single wildcard spanning the union of their rule tags once the pool
/// clears the threshold; below threshold, members keep their identity
/// pattern (never forced).
#[derive(Debug, Default)]
pub struct FuzzyPatternCluster {
    bags: Vec<PieceBag>,
    threshold: i64,
}

impl FuzzyPatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag, threshold: i64) {
        self.threshold = threshold;
        self.bags.push(bag);
    }

    #[tracing::instrument(level = "trace", skip(self, tree))]
    pub fn cluster(&mut self, tree: &mut PiecePatternTree) -> ClusterResult<()> {
        if self.bags.is_empty() {
            return Ok(());
        }

        let total: i64 = self.bags.iter().map(|b| b.count()).sum();
        let max = self.bags.iter().map(|b| b.count()).max().unwrap_or(0);

        if total < self.threshold || !confused(total, max, self.threshold) {
            return Ok(());
        }

        let mut seen = Vec::new();
        for bag in &self.bags {
            let tag = bag.fuzzy_rule().to_string();
            if !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        let pattern = Pattern::wildcard(&seen.join(""));

        for bag in &self.bags {
            bag.set_pattern(tree, &pattern)?;
        }
        Ok(())
    }
}
