use crate::piece::ParsedPiece;

use super::error::{TreeError, TreeResult};
use super::node::{NodeId, TreeNode};

/// A prefix tree of parsed pieces. All root-to-leaf paths have the same
/// length, equal to the owning `UrlMeta`'s `depth()`.
#[derive(Debug)]
pub struct PiecePatternTree {
    nodes: Vec<TreeNode>,
}

impl Default for PiecePatternTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PiecePatternTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Walks from the root, inserting a child for each piece if absent,
    /// accumulating `count` into every node on the path.
    #[tracing::instrument(level = "trace", skip(self, pieces), fields(len = pieces.len(), count))]
    pub fn add_parsed_pieces(&mut self, pieces: &[ParsedPiece], count: u64) -> TreeResult<()> {
        if count == 0 {
            return Err(TreeError::NonPositiveCount { count: 0 });
        }

        let mut current = self.root();
        self.nodes[current.0 as usize].count += count;

        for piece in pieces {
            let existing = self.nodes[current.0 as usize].find_child(&piece.piece);
            let next = match existing {
                Some(id) => id,
                None => {
                    let id = NodeId(self.nodes.len() as u32);
                    self.nodes.push(TreeNode::leaf(piece.clone(), current));
                    self.nodes[current.0 as usize].push_child(&piece.piece, id);
                    id
                }
            };
            self.nodes[next.0 as usize].count += count;
            current = next;
        }

        Ok(())
    }

    /// Yields every leaf-terminated path as an ordered sequence of nodes,
    /// root's direct children through to the leaves.
    pub fn iter_paths(&self) -> Vec<Vec<NodeId>> {
        let mut paths = Vec::new();
        let mut stack: Vec<Vec<NodeId>> = self
            .node(self.root())
            .iter_children()
            .map(|c| vec![c])
            .collect();

        while let Some(path) = stack.pop() {
            let last = *path.last().unwrap();
            let node = self.node(last);
            if node.children_num() == 0 {
                paths.push(path);
            } else {
                for child in node.iter_children() {
                    let mut extended = path.clone();
                    extended.push(child);
                    stack.push(extended);
                }
            }
        }

        paths.reverse();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceParser;

    fn pieces(strs: &[&str]) -> Vec<ParsedPiece> {
        strs.iter().map(|s| PieceParser::parse(s).unwrap()).collect()
    }

    #[test]
    fn accumulates_counts_along_shared_prefix() {
        let mut tree = PiecePatternTree::new();
        tree.add_parsed_pieces(&pieces(&["u", "1", "p"]), 1).unwrap();
        tree.add_parsed_pieces(&pieces(&["u", "2", "p"]), 1).unwrap();

        let root = tree.root();
        assert_eq!(tree.node(root).count, 2);
        let u_child = tree.node(root).find_child("u").unwrap();
        assert_eq!(tree.node(u_child).count, 2);
        assert_eq!(tree.node(u_child).children_num(), 2);
    }

    #[test]
    fn rejects_zero_count() {
        let mut tree = PiecePatternTree::new();
        assert!(tree.add_parsed_pieces(&pieces(&["a"]), 0).is_err());
    }

    #[test]
    fn iter_paths_yields_every_leaf() {
        let mut tree = PiecePatternTree::new();
        tree.add_parsed_pieces(&pieces(&["a", "x"]), 1).unwrap();
        tree.add_parsed_pieces(&pieces(&["a", "y"]), 1).unwrap();
        tree.add_parsed_pieces(&pieces(&["b", "x"]), 1).unwrap();

        let paths = tree.iter_paths();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert_eq!(path.len(), 2);
        }
    }
}
