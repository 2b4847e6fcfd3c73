use hashbrown::HashMap as FastHashMap;

use crate::pattern::Pattern;
use crate::piece::{CharClass, PieceParser};
use crate::tree::PiecePatternTree;

use super::bag::{confused, PieceBag};
use super::base::recursively_generalize;
use super::error::ClusterResult;

fn reparse(text: &str) -> crate::piece::ParsedPiece {
    PieceParser::parse(text).expect("already-parsed piece text is always re-parseable")
}

/// Last resort on the final path segment before Fuzzy: splits each piece on
/// its last `.` and groups by extension, so `report.pdf`/`invoice.pdf`
/// cluster on the shared `.pdf` suffix even when their stems don't line up
/// as a clean positional composite. Structurally identical to Base (per
/// spec.md §4.3.4): the stem side is generalized by the same recursive
/// inner-cascade mechanism `Base` uses for a varying composite position,
/// just restricted to the two-part stem/extension decomposition instead of
/// Base's full positional split.
#[derive(Debug, Default)]
pub struct LastDotSplitFuzzyPatternCluster {
    groups: FastHashMap<String, Vec<(PieceBag, String)>>,
    order: Vec<String>,
    unsplittable: Vec<PieceBag>,
}

impl LastDotSplitFuzzyPatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag) {
        match bag.piece().rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                let ext = ext.to_string();
                if !self.groups.contains_key(&ext) {
                    self.order.push(ext.clone());
                }
                self.groups.entry(ext).or_default().push((bag, stem.to_string()));
            }
            _ => self.unsplittable.push(bag),
        }
    }

    #[tracing::instrument(level = "trace", skip(self, tree))]
    pub fn cluster(&mut self, tree: &mut PiecePatternTree, threshold: i64) -> ClusterResult<Vec<PieceBag>> {
        let mut residue = std::mem::take(&mut self.unsplittable);

        for ext in self.order.drain(..) {
            let group = self.groups.remove(&ext).unwrap();
            let total: i64 = group.iter().map(|(b, _)| b.count()).sum();
            let max = group.iter().map(|(b, _)| b.count()).max().unwrap_or(0);

            if total < threshold || !confused(total, max, threshold) {
                residue.extend(group.into_iter().map(|(b, _)| b));
                continue;
            }

            let mut stem_counts: FastHashMap<&str, i64> = FastHashMap::new();
            for (bag, stem) in &group {
                *stem_counts.entry(stem.as_str()).or_insert(0) += bag.count();
            }

            let stem_pattern = if stem_counts.len() == 1 {
                Pattern::identity(&reparse(stem_counts.keys().next().unwrap()))
            } else {
                let values: Vec<(&str, i64)> = stem_counts.into_iter().collect();
                match recursively_generalize(&values, threshold)? {
                    Some(pattern) => pattern,
                    None => {
                        residue.extend(group.into_iter().map(|(b, _)| b));
                        continue;
                    }
                }
            };

            let dot = Pattern::class(CharClass::Other(b'.'));
            let ext_parsed = reparse(&ext);
            let ext_pattern = Pattern::identity(&ext_parsed);

            let composite = Pattern::composite([&stem_pattern, &dot, &ext_pattern]);
            for (bag, _) in &group {
                bag.set_pattern(tree, &composite)?;
            }
        }

        Ok(residue)
    }
}
