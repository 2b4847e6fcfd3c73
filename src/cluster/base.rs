use hashbrown::HashMap as FastHashMap;

use crate::pattern::Pattern;
use crate::piece::{CharClass, PieceParser};
use crate::tree::PiecePatternTree;

use super::bag::{confused, PieceBag};
use super::error::ClusterResult;
use super::processor::{ClusterProcessor, MetaInfo};

/// Groups multi-sub-piece pieces (e.g. `report_2023.pdf`) by their exact
/// positional rule signature — the sequence of character classes across
/// sub-pieces, not deduped like `fuzzy_rule`. Bags whose signature and
/// per-position structure survive the threshold get a composite pattern
/// rebuilt position by position, each varying position generalized by its
/// own recursive inner cascade (see [`recursively_generalize`]); everything
/// else residues to Mixed.
#[derive(Debug, Default)]
pub struct BasePatternCluster {
    groups: FastHashMap<String, Vec<PieceBag>>,
    order: Vec<String>,
}

pub(super) fn structural_key(tree: &PiecePatternTree, bag: &PieceBag) -> String {
    let node = tree.node(bag.nodes()[0]);
    let parsed = node
        .parsed_piece
        .as_ref()
        .expect("base cluster only receives multi-sub-piece pieces");
    parsed
        .rules
        .iter()
        .map(|r| r.tag())
        .collect::<Vec<_>>()
        .join("|")
}

impl BasePatternCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bag: PieceBag) {
        // structural_key needs `tree`, deferred to `cluster` where it is
        // available; stash bags under a placeholder key for now.
        self.order.push(bag.piece().to_string());
        self.groups.entry(String::new()).or_default().push(bag);
    }

    #[tracing::instrument(level = "trace", skip(self, tree))]
    pub fn cluster(&mut self, tree: &mut PiecePatternTree, threshold: i64) -> ClusterResult<Vec<PieceBag>> {
        let pending: Vec<PieceBag> = self.groups.remove("").unwrap_or_default();

        let mut by_key: FastHashMap<String, Vec<PieceBag>> = FastHashMap::new();
        let mut key_order = Vec::new();
        for bag in pending {
            let key = structural_key(tree, &bag);
            if !by_key.contains_key(&key) {
                key_order.push(key.clone());
            }
            by_key.entry(key).or_default().push(bag);
        }

        let mut residue = Vec::new();

        for key in key_order {
            let group = by_key.remove(&key).unwrap();
            let total: i64 = group.iter().map(|b| b.count()).sum();
            let max = group.iter().map(|b| b.count()).max().unwrap_or(0);

            if total < threshold || !confused(total, max, threshold) {
                residue.extend(group);
                continue;
            }

            match build_composite(tree, &group, threshold)? {
                Some(pattern) => {
                    for bag in &group {
                        bag.set_pattern(tree, &pattern)?;
                    }
                }
                None => residue.extend(group),
            }
        }

        Ok(residue)
    }
}

/// Rebuilds a composite pattern position by position: a position whose
/// sub-piece text is identical across every bag stays literal; one that
/// varies enough to pass the threshold is handed to
/// [`recursively_generalize`], which builds a fresh inner tree over just
/// that position's distinct values and runs the same cascade on it,
/// lifting the result back as this position's contribution to the
/// composite. A position whose inner cascade doesn't converge on one
/// shared pattern fails the whole group's composition.
pub(super) fn build_composite(
    tree: &PiecePatternTree,
    group: &[PieceBag],
    threshold: i64,
) -> ClusterResult<Option<Pattern>> {
    let representative = tree
        .node(group[0].nodes()[0])
        .parsed_piece
        .as_ref()
        .expect("base cluster only receives multi-sub-piece pieces");
    let position_count = representative.pieces.len();

    let mut positions: Vec<Vec<(&str, CharClass, i64)>> = vec![Vec::new(); position_count];
    for bag in group {
        let node = tree.node(bag.nodes()[0]);
        let parsed = node.parsed_piece.as_ref().unwrap();
        if parsed.pieces.len() != position_count {
            return Ok(None);
        }
        for i in 0..position_count {
            positions[i].push((parsed.pieces[i].as_str(), parsed.rules[i], bag.count()));
        }
    }

    let mut parts = Vec::with_capacity(position_count);
    for column in positions {
        let distinct: FastHashMap<&str, i64> = column.iter().fold(FastHashMap::new(), |mut acc, (text, _, count)| {
            *acc.entry(*text).or_insert(0) += count;
            acc
        });
        let total: i64 = distinct.values().sum();
        let class = column[0].1;

        if distinct.len() == 1 {
            let (text, _, _) = column[0];
            let pattern = match class {
                CharClass::Other(_) => Pattern::class(class),
                _ => Pattern::literal(text, &class.tag()),
            };
            parts.push(pattern);
            continue;
        }

        let max = *distinct.values().max().unwrap_or(&0);
        if total < threshold || !confused(total, max, threshold) {
            return Ok(None);
        }

        let values: Vec<(&str, i64)> = distinct.into_iter().collect();
        match recursively_generalize(&values, threshold)? {
            Some(pattern) => parts.push(pattern),
            None => return Ok(None),
        }
    }

    Ok(Some(Pattern::composite(parts.iter())))
}

/// Builds a one-level inner piece-pattern tree over a single composite
/// position's distinct values (weighted by occurrence count) and runs the
/// same `ClusterProcessor` cascade used at the top level on it. Lifts the
/// result back only if every distinct value converged on the exact same
/// induced pattern (e.g. all-digit values generalizing to `[0-9]+`); if the
/// inner cascade leaves some values literal and others not, or splits them
/// across different patterns, this position can't be expressed as one
/// composite element.
pub(super) fn recursively_generalize(values: &[(&str, i64)], threshold: i64) -> ClusterResult<Option<Pattern>> {
    let mut inner = PiecePatternTree::new();
    for (text, count) in values {
        let parsed = PieceParser::parse(text).expect("already-parsed piece text is always re-parseable");
        inner.add_parsed_pieces(&[parsed], *count as u64)?;
    }

    let mut processor = ClusterProcessor::new(MetaInfo::for_inner(1), threshold);
    let root = inner.root();
    let children: Vec<_> = inner.node(root).iter_children().collect();
    for child in &children {
        processor.add(*child, &inner);
    }
    processor.process(&mut inner, None)?;

    let first = inner.node(children[0]).pattern().clone();
    if children.iter().all(|&c| *inner.node(c).pattern() == first) {
        Ok(Some(first))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceParser;

    fn bag_for(tree: &mut PiecePatternTree, piece: &str, count: u64) -> PieceBag {
        let parsed = PieceParser::parse(piece).unwrap();
        tree.add_parsed_pieces(&[parsed], count).unwrap();
        let root = tree.root();
        let node_id = tree.node(root).find_child(piece).unwrap();
        let mut bucket = super::super::bag::PieceBucket::new();
        bucket.add(node_id, tree);
        bucket.get(piece).unwrap().clone()
    }

    /// Three structurally-varying positions (letter, digit, trailing
    /// letter) around one fixed separator: each varying position must
    /// converge through its own recursive inner cascade independently.
    #[test]
    fn composes_three_varying_positions_via_recursion() {
        let mut tree = PiecePatternTree::new();
        let group = vec![
            bag_for(&mut tree, "a1-p", 1),
            bag_for(&mut tree, "b2-q", 1),
            bag_for(&mut tree, "c3-r", 1),
        ];

        let pattern = build_composite(&tree, &group, 3).unwrap().unwrap();
        // positions 0, 1, and 3 each recurse independently and converge on
        // an exact-length bound; position 2 (the dash) stays literal.
        assert_eq!(pattern.as_str(), "[a-z]{1}[0-9]{1}[\\-][a-z]{1}");
    }
}
