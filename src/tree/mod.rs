mod error;
mod node;
mod piece_tree;

pub use error::TreeError;
pub use node::{NodeId, TreeNode};
pub use piece_tree::PiecePatternTree;
