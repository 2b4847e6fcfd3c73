//! Induces compact URL patterns from a corpus of concrete URLs.
//!
//! A corpus of URLs sharing the same structural shape (path depth, query
//! key set, fragment presence) is parsed into a prefix tree over their
//! segments, then clustered level by level: literal pieces that look like
//! noise (sequential ids, hashes, dates) get generalized into character-class
//! patterns, while pieces that recur identically stay literal. See
//! [`cluster::cluster`] for the cascade and [`maker::PatternMaker`] for the
//! end-to-end entry point.

pub mod cluster;
pub mod config;
pub mod error;
pub mod maker;
pub mod matcher;
pub mod pattern;
pub mod piece;
pub mod tree;
pub mod url;

pub use config::Config;
pub use error::{Error, Result};
pub use maker::{PatternMaker, PatternPath};
pub use matcher::{CompiledPattern, PatternMatchTree};
