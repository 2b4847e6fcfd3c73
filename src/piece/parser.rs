use super::error::{PieceError, PieceResult};
use super::rule::CharClass;

/// A URL segment decomposed into maximal runs of a single character class.
///
/// Two parsed pieces are equal iff their `piece` (the original literal) is
/// equal; `pieces`/`rules` are kept for cluster strategies that need the
/// sub-piece structure, not for equality.
#[derive(Debug, Clone)]
pub struct ParsedPiece {
    pub pieces: Vec<String>,
    pub rules: Vec<CharClass>,
    pub piece: String,
    pub piece_length: usize,
    pub fuzzy_rule: String,
}

impl PartialEq for ParsedPiece {
    fn eq(&self, other: &Self) -> bool {
        self.piece == other.piece
    }
}
impl Eq for ParsedPiece {}

impl std::hash::Hash for ParsedPiece {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.piece.hash(state);
    }
}

impl ParsedPiece {
    /// Concatenation of each sub-piece's identity form: literal text for
    /// alpha/digit runs, `\<char>` for a lone "other" byte.
    pub fn identity_pattern(&self) -> String {
        let mut out = String::with_capacity(self.piece_length);
        for (text, rule) in self.pieces.iter().zip(self.rules.iter()) {
            match rule {
                CharClass::Other(_) => out.push_str(&rule.tag()),
                _ => out.push_str(text),
            }
        }
        out
    }
}

pub struct PieceParser;

impl PieceParser {
    #[tracing::instrument(level = "trace", fields(piece = %piece))]
    pub fn parse(piece: &str) -> PieceResult<ParsedPiece> {
        if piece.is_empty() {
            return Err(PieceError::Empty);
        }

        let bytes = piece.as_bytes();
        let mut pieces = Vec::new();
        let mut rules = Vec::new();
        let mut seen_tags: Vec<String> = Vec::new();

        let mut i = 0usize;
        while i < bytes.len() {
            let class = CharClass::of(bytes[i]).ok_or_else(|| PieceError::InvalidChar {
                piece: piece.to_string(),
                byte: bytes[i],
            })?;

            let start = i;
            i += 1;
            // "Other" is a single escaped byte, never a run longer than 1.
            if !matches!(class, CharClass::Other(_)) {
                while i < bytes.len() && CharClass::of(bytes[i]) == Some(class) {
                    i += 1;
                }
            }

            let sub = &piece[start..i];
            let tag = class.tag();
            if !seen_tags.contains(&tag) {
                seen_tags.push(tag);
            }
            pieces.push(sub.to_string());
            rules.push(class);
        }

        Ok(ParsedPiece {
            piece_length: piece.len(),
            piece: piece.to_string(),
            fuzzy_rule: seen_tags.join(""),
            pieces,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_runs_by_class() {
        let p = PieceParser::parse("item-1").unwrap();
        assert_eq!(p.pieces, vec!["item", "-", "1"]);
        assert_eq!(
            p.rules,
            vec![CharClass::Lower, CharClass::Other(b'-'), CharClass::Digit]
        );
        assert_eq!(p.fuzzy_rule, "a-z\\-0-9");
    }

    #[test]
    fn dedupes_fuzzy_rule_by_first_occurrence() {
        let p = PieceParser::parse("a.html").unwrap();
        assert_eq!(p.pieces, vec!["a", ".", "html"]);
        assert_eq!(p.fuzzy_rule, "a-z\\.");
    }

    #[test]
    fn rejects_non_printable_ascii() {
        let err = PieceParser::parse("foo\u{7f}bar").unwrap_err();
        assert!(matches!(err, PieceError::InvalidChar { .. }));
    }

    #[test]
    fn rejects_non_ascii() {
        let err = PieceParser::parse("café").unwrap_err();
        assert!(matches!(err, PieceError::InvalidChar { .. }));
    }

    #[test]
    fn single_char_piece() {
        let p = PieceParser::parse("1").unwrap();
        assert_eq!(p.pieces, vec!["1"]);
        assert_eq!(p.piece_length, 1);
    }
}
