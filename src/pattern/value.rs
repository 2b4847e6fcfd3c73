use std::sync::Arc;

use crate::piece::{CharClass, ParsedPiece};

use super::intern;

/// A canonical string generalizing one or more parsed pieces. Equality and
/// hashing are by interned identity: two patterns with the same canonical
/// form always share the same `Arc<str>` allocation.
#[derive(Debug, Clone)]
pub struct Pattern {
    canonical: Arc<str>,
    fuzzy_rule: Arc<str>,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.canonical, &other.canonical)
    }
}
impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.canonical) as *const () as usize).hash(state);
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Pattern {
    fn from_parts(canonical: String, fuzzy_rule: String) -> Self {
        Self {
            canonical: intern(&canonical),
            fuzzy_rule: intern(&fuzzy_rule),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn fuzzy_rule(&self) -> &str {
        &self.fuzzy_rule
    }

    /// The un-generalized pattern: a parsed piece's own literal, after escaping.
    pub fn identity(piece: &ParsedPiece) -> Self {
        Self::from_parts(piece.identity_pattern(), piece.fuzzy_rule.clone())
    }

    /// An exact-length numeric/alpha bound, e.g. `[0-9]{5}`, built from a
    /// single-class fuzzy rule tag plus an exact length.
    pub fn numeric_bound(rule_tag: &str, length: usize) -> Self {
        let canonical = format!("[{rule_tag}]{{{length}}}");
        Self::from_parts(canonical, rule_tag.to_string())
    }

    /// An unbounded wildcard, e.g. `[0-9]+`, built from a single-class fuzzy
    /// rule tag.
    pub fn wildcard(rule_tag: &str) -> Self {
        let canonical = format!("[{rule_tag}]+");
        Self::from_parts(canonical, rule_tag.to_string())
    }

    /// A bracketed single character class, e.g. `[\-]`, used verbatim (no
    /// quantifier) when a "base"/"mixed" composite keeps a class but not its
    /// cardinality.
    pub fn class(class: CharClass) -> Self {
        Self::from_parts(class.bracket(), class.tag())
    }

    /// Ordered concatenation of already-canonical patterns; the fuzzy rule
    /// is the concatenation of the parts' own fuzzy rules, matching how a
    /// multi-sub-piece `ParsedPiece::fuzzy_rule` is built.
    pub fn composite<'a>(parts: impl IntoIterator<Item = &'a Pattern>) -> Self {
        let mut canonical = String::new();
        let mut seen = Vec::new();

        for p in parts {
            canonical.push_str(&p.canonical);
            let tag = p.fuzzy_rule.to_string();
            if !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        Self::from_parts(canonical, seen.join(""))
    }

    /// Literal text rendered verbatim, with its own fuzzy rule tag supplied
    /// by the caller (used for the invariant sub-pieces of a composite).
    pub fn literal(text: &str, rule_tag: &str) -> Self {
        Self::from_parts(text.to_string(), rule_tag.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceParser;

    #[test]
    fn identity_escapes_other_classes() {
        let piece = PieceParser::parse("item-1").unwrap();
        let pat = Pattern::identity(&piece);
        assert_eq!(pat.as_str(), "item\\-1");
    }

    #[test]
    fn wildcard_and_numeric_bound() {
        assert_eq!(Pattern::wildcard("0-9").as_str(), "[0-9]+");
        assert_eq!(Pattern::numeric_bound("0-9", 5).as_str(), "[0-9]{5}");
    }

    #[test]
    fn composite_concatenates_parts() {
        let a = Pattern::literal("item", "a-z");
        let b = Pattern::class(CharClass::Other(b'-'));
        let c = Pattern::wildcard("0-9");
        let composite = Pattern::composite([&a, &b, &c]);
        assert_eq!(composite.as_str(), "item[\\-][0-9]+");
    }

    #[test]
    fn equal_canonical_forms_intern_to_same_pattern() {
        let a = Pattern::wildcard("0-9");
        let b = Pattern::wildcard("0-9");
        assert_eq!(a, b);
    }
}
