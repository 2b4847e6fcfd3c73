use hashbrown::HashMap as FastHashMap;

use crate::cluster::cluster;
use crate::config::Config;
use crate::error::Result;
use crate::piece::PieceParser;
use crate::tree::PiecePatternTree;
use crate::url::{parse_url, UrlMeta};

/// Ingests a corpus of URLs, routes each into the tree for its structural
/// shape, runs the cascade over every tree, and renders the resulting
/// patterns. One tree per distinct `UrlMeta`, the same way the teacher
/// keys its routing tables by method/shape before walking a single tree.
#[derive(Debug)]
pub struct PatternMaker {
    config: Config,
    trees: FastHashMap<UrlMeta, PiecePatternTree>,
    order: Vec<UrlMeta>,
}

impl PatternMaker {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            trees: FastHashMap::new(),
            order: Vec::new(),
        }
    }

    #[tracing::instrument(level = "trace", skip(self), fields(url = %url))]
    pub fn load(&mut self, url: &str) -> Result<()> {
        let (meta, pieces) = parse_url(url)?;
        let parsed = pieces
            .iter()
            .map(|p| PieceParser::parse(p))
            .collect::<std::result::Result<Vec<_>, crate::piece::PieceError>>()?;

        if !self.trees.contains_key(&meta) {
            self.order.push(meta.clone());
            self.trees.insert(meta.clone(), PiecePatternTree::new());
        }
        self.trees
            .get_mut(&meta)
            .unwrap()
            .add_parsed_pieces(&parsed, 1)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn cluster_all(&mut self) -> Result<()> {
        for meta in &self.order {
            let tree = self.trees.get_mut(meta).unwrap();
            cluster(tree, meta, self.config.make.min_cluster_num)?;
        }
        Ok(())
    }

    /// Renders every induced pattern path, one line per distinct shape plus
    /// per-leaf pattern, in insertion order.
    pub fn dump(&self) -> Vec<PatternPath> {
        let mut out = Vec::new();
        for meta in &self.order {
            let tree = &self.trees[meta];
            for path in tree.iter_paths() {
                let mut segments = Vec::with_capacity(path.len());
                let mut count = 0;
                for node_id in &path {
                    let node = tree.node(*node_id);
                    segments.push(node.pattern().as_str().to_string());
                    count = node.count;
                }
                out.push(PatternPath {
                    meta: meta.clone(),
                    segments,
                    count,
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPath {
    pub meta: UrlMeta,
    pub segments: Vec<String>,
    pub count: u64,
}

impl std::fmt::Display for PatternPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.segments.join("/"), self.count)
    }
}
