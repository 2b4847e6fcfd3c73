use crate::tree::PiecePatternTree;
use crate::url::UrlMeta;

use super::error::ClusterResult;
use super::processor::{ClusterProcessor, MetaInfo};

/// Runs the full cascade over a tree already populated via
/// [`PiecePatternTree::add_parsed_pieces`], assigning a pattern to every
/// node reachable from the root.
#[tracing::instrument(level = "debug", skip(tree), fields(threshold = min_cluster_num))]
pub fn cluster(tree: &mut PiecePatternTree, url_meta: &UrlMeta, min_cluster_num: i64) -> ClusterResult<()> {
    let meta_info = MetaInfo::for_url(url_meta.clone());
    let mut root_processor = ClusterProcessor::new(meta_info, min_cluster_num);
    let children: Vec<_> = tree.node(tree.root()).iter_children().collect();
    for child in children {
        root_processor.add(child, tree);
    }
    root_processor.process(tree, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceParser;

    fn insert(tree: &mut PiecePatternTree, segments: &[&str], count: u64) {
        let parsed: Vec<_> = segments.iter().map(|s| PieceParser::parse(s).unwrap()).collect();
        tree.add_parsed_pieces(&parsed, count).unwrap();
    }

    fn url_meta(path_depth: usize) -> UrlMeta {
        UrlMeta::new(path_depth, Vec::new(), false)
    }

    #[test]
    fn numeric_siblings_cluster_into_a_length_bound() {
        let mut tree = PiecePatternTree::new();
        insert(&mut tree, &["item-1"], 1);
        insert(&mut tree, &["item-2"], 1);
        insert(&mut tree, &["item-3"], 1);

        cluster(&mut tree, &url_meta(1), 3).unwrap();

        let root = tree.root();
        for child in tree.node(root).iter_children() {
            assert_eq!(tree.node(child).pattern().as_str(), "item[\\-][0-9]+");
        }
    }

    #[test]
    fn below_threshold_pieces_stay_literal() {
        let mut tree = PiecePatternTree::new();
        insert(&mut tree, &["users"], 1);
        insert(&mut tree, &["posts"], 1);

        cluster(&mut tree, &url_meta(1), 3).unwrap();

        let root = tree.root();
        let mut patterns: Vec<String> = tree
            .node(root)
            .iter_children()
            .map(|c| tree.node(c).pattern().as_str().to_string())
            .collect();
        patterns.sort();
        assert_eq!(patterns, vec!["posts".to_string(), "users".to_string()]);
    }
}
