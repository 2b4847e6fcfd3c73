use hashbrown::HashMap as FastHashMap;
use smallvec::SmallVec;

use crate::pattern::Pattern;
use crate::piece::ParsedPiece;

use super::error::{TreeError, TreeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// A node in the piece-pattern tree. `parsed_piece` is `None` only for the
/// root sentinel. `children` is kept as parallel key/index vectors (mirroring
/// a small-map-before-hashmap layout) so sibling iteration stays in insertion
/// order, which determinism (spec §5) depends on.
#[derive(Debug)]
pub struct TreeNode {
    pub parsed_piece: Option<ParsedPiece>,
    pattern: Option<Pattern>,
    reassigned: bool,
    pub count: u64,
    pub(super) parent: Option<NodeId>,
    child_keys: SmallVec<[Box<str>; 8]>,
    child_ids: SmallVec<[NodeId; 8]>,
    child_index: FastHashMap<Box<str>, usize>,
}

impl TreeNode {
    pub(super) fn root() -> Self {
        Self {
            parsed_piece: None,
            pattern: None,
            reassigned: false,
            count: 0,
            parent: None,
            child_keys: SmallVec::new(),
            child_ids: SmallVec::new(),
            child_index: FastHashMap::new(),
        }
    }

    pub(super) fn leaf(parsed_piece: ParsedPiece, parent: NodeId) -> Self {
        let pattern = Pattern::identity(&parsed_piece);
        Self {
            parsed_piece: Some(parsed_piece),
            pattern: Some(pattern),
            reassigned: false,
            count: 0,
            parent: Some(parent),
            child_keys: SmallVec::new(),
            child_ids: SmallVec::new(),
            child_index: FastHashMap::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn piece(&self) -> &str {
        self.parsed_piece
            .as_ref()
            .map(|p| p.piece.as_str())
            .unwrap_or("")
    }

    pub fn pattern(&self) -> &Pattern {
        self.pattern.as_ref().expect("non-root node always has a pattern")
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Assigns a coarser pattern to this node. Must only be called once per
    /// clustering run (spec invariant: pattern monotonicity) and only with a
    /// pattern whose fuzzy rule matches the node's own parsed piece.
    pub fn assign_pattern(&mut self, pattern: Pattern) -> TreeResult<()> {
        if self.reassigned {
            return Err(TreeError::PatternAlreadyAssigned);
        }
        debug_assert_eq!(
            self.parsed_piece.as_ref().map(|p| p.fuzzy_rule.as_str()),
            Some(pattern.fuzzy_rule()),
            "pattern fuzzy_rule must match the node's parsed-piece fuzzy_rule"
        );
        self.pattern = Some(pattern);
        self.reassigned = true;
        Ok(())
    }

    pub fn children_num(&self) -> usize {
        self.child_ids.len()
    }

    pub fn iter_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.child_ids.iter().copied()
    }

    pub(crate) fn find_child(&self, piece: &str) -> Option<NodeId> {
        self.child_index.get(piece).map(|&i| self.child_ids[i])
    }

    pub(super) fn push_child(&mut self, piece: &str, id: NodeId) {
        let idx = self.child_ids.len();
        self.child_keys.push(piece.into());
        self.child_ids.push(id);
        self.child_index.insert(piece.into(), idx);
    }
}
