use regex::Regex;

use crate::maker::PatternPath;
use crate::pattern::PatternError;
use crate::url::{pack, parse_url};

/// A compiled form of one induced pattern path, ready to test concrete URLs
/// against.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: PatternPath,
    regex: Regex,
}

/// Matches concrete URLs back against a set of induced patterns.
///
/// This is intentionally a sketch, not a full implementation: it tries
/// patterns in insertion order and returns the first match, with no
/// handling of overlapping patterns, no precedence between a more specific
/// and a more general pattern that both match, and no support for patterns
/// spanning query parameters. A real implementation would need its own
/// tree keyed by pattern structure (mirroring `PiecePatternTree` but over
/// patterns instead of literals) to resolve ambiguity deterministically;
/// the induction side of this crate does not need that tree to exist.
#[derive(Debug, Default)]
pub struct PatternMatchTree {
    patterns: Vec<CompiledPattern>,
}

impl PatternMatchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles one induced path into a regex anchored on the reconstructed
    /// `/seg/seg/...` form. Bracketed rule classes and `+`/`{n}` quantifiers
    /// already read as valid regex syntax; only path separators need adding.
    ///
    /// A pattern line that fails to compile is a fatal error, not a line to
    /// skip: a pattern file is a trusted artifact produced by this crate's
    /// own `make` step, so a malformed line means the file is corrupt or
    /// foreign, and matching against a silently-incomplete pattern set would
    /// misreport which URLs match.
    pub fn add(&mut self, path: PatternPath) -> Result<(), PatternError> {
        let body = path.segments.join("/");
        let anchored = format!("^/{body}$");
        let regex = Regex::new(&anchored).map_err(|e| PatternError::InvalidPattern {
            raw: body,
            reason: e.to_string(),
        })?;
        self.patterns.push(CompiledPattern {
            source: path,
            regex,
        });
        Ok(())
    }

    /// Returns the first pattern (by insertion order) whose reconstructed
    /// path matches `url`'s path portion.
    #[tracing::instrument(level = "trace", skip(self), fields(url = %url))]
    pub fn match_url(&self, url: &str) -> crate::error::Result<Option<&CompiledPattern>> {
        let (meta, pieces) = parse_url(url)?;
        let reconstructed = pack(&meta, &pieces);
        let path_only = reconstructed.split(['?', '#']).next().unwrap_or(&reconstructed);

        Ok(self.patterns.iter().find(|p| p.regex.is_match(path_only)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::UrlMeta;

    #[test]
    fn matches_a_compiled_wildcard_path() {
        let mut tree = PatternMatchTree::new();
        tree.add(PatternPath {
            meta: UrlMeta::new(1, Vec::new(), false),
            segments: vec!["item[\\-][0-9]+".to_string()],
            count: 3,
        })
        .unwrap();

        let hit = tree.match_url("http://example.com/item-42").unwrap();
        assert!(hit.is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let tree = PatternMatchTree::new();
        let hit = tree.match_url("http://example.com/anything").unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn malformed_pattern_line_is_fatal() {
        let mut tree = PatternMatchTree::new();
        let err = tree
            .add(PatternPath {
                meta: UrlMeta::new(1, Vec::new(), false),
                segments: vec!["(unclosed".to_string()],
                count: 1,
            })
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern { .. }));
    }
}
