//! Pattern tokens.
//!
//! A raw token is either a block type name compared literally, or a
//! regular expression written as `/body/flags`. Supported flags are `i`,
//! `m`, `s` and `u`; `g` and `y` are accepted and ignored. A regex token
//! that fails to compile becomes inert and matches nothing.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::warn;

static REGEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(.+)/([gimsuy]*)$").expect("valid regex literal pattern"));

/// One compiled pattern element.
#[derive(Debug, Clone)]
pub enum Token {
    /// Must equal the block type exactly.
    Literal(String),
    /// Must match somewhere in the block type.
    Regex(Regex),
    /// A regex that failed to compile.
    Inert { source: String },
}

impl Token {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let Some(caps) = REGEX_LITERAL.captures(raw) else {
            return Token::Literal(raw.to_string());
        };

        let mut builder = RegexBuilder::new(&caps[1]);
        for flag in caps[2].chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                _ => {}
            }
        }

        match builder.build() {
            Ok(regex) => Token::Regex(regex),
            Err(err) => {
                warn!(token = raw, error = %err, "regex token will never match");
                Token::Inert {
                    source: raw.to_string(),
                }
            }
        }
    }

    pub fn matches(&self, block_type: &str) -> bool {
        match self {
            Token::Literal(literal) => literal == block_type,
            Token::Regex(regex) => regex.is_match(block_type),
            Token::Inert { .. } => false,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, Token::Inert { .. })
    }
}

/// An ordered list of tokens.
#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<Token>,
}

impl Pattern {
    pub fn compile<S: AsRef<str>>(raw: &[S]) -> Self {
        Self {
            tokens: raw.iter().map(|t| Token::parse(t.as_ref())).collect(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the tokens match `types` position by position, starting at `start`.
    fn matches_at(&self, types: &[&str], start: usize) -> bool {
        self.tokens
            .iter()
            .zip(&types[start..])
            .all(|(token, ty)| token.matches(ty))
    }

    /// The tokens appear as a contiguous run somewhere in `types`.
    /// An empty pattern never matches.
    pub fn matches_contiguous(&self, types: &[&str]) -> bool {
        if self.tokens.is_empty() || types.len() < self.tokens.len() {
            return false;
        }
        (0..=types.len() - self.tokens.len()).any(|start| self.matches_at(types, start))
    }

    /// `types` has exactly as many entries as the pattern and every
    /// position matches.
    pub fn matches_exact(&self, types: &[&str]) -> bool {
        types.len() == self.tokens.len() && self.matches_at(types, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_token() {
        let token = Token::parse("green-flag");
        assert!(token.matches("green-flag"));
        assert!(!token.matches("Green-Flag"));
        assert!(!token.matches("green-flag-2"));
    }

    #[test]
    fn test_regex_token() {
        let token = Token::parse("/^green[- ]?flag$/");
        assert!(token.matches("green-flag"));
        assert!(token.matches("green flag"));
        assert!(token.matches("greenflag"));
        assert!(!token.matches("Green-Flag"));
        assert!(!token.matches("red-flag"));
    }

    #[test]
    fn test_regex_flags() {
        let token = Token::parse("/^green[- ]?flag$/i");
        assert!(token.matches("Green-Flag"));
        let token = Token::parse("/flag/gy");
        assert!(token.matches("green-flag"));
    }

    #[test]
    fn test_unknown_flags_read_as_literal() {
        let token = Token::parse("/up/x");
        assert!(matches!(token, Token::Literal(ref s) if s == "/up/x"));
    }

    #[test]
    fn test_invalid_regex_is_inert() {
        let token = Token::parse("/up(/");
        assert!(token.is_inert());
        assert!(!token.matches("up("));
        assert!(!token.matches("up"));
    }

    #[test]
    fn test_contiguous_match() {
        let pattern = Pattern::compile(&["/^green[- ]?flag$/i", "up"]);
        assert!(pattern.matches_contiguous(&["green-flag", "up", "down", "delay"]));
        assert!(pattern.matches_contiguous(&["delay", "green-flag", "up"]));
        assert!(!pattern.matches_contiguous(&["green-flag", "delay", "up"]));
        assert!(!pattern.matches_contiguous(&["green-flag"]));
        assert!(!Pattern::compile::<&str>(&[]).matches_contiguous(&["up"]));
    }

    #[test]
    fn test_exact_match() {
        let pattern = Pattern::compile(&["green-flag", "up", "down"]);
        assert!(pattern.matches_exact(&["green-flag", "up", "down"]));
        assert!(!pattern.matches_exact(&["green-flag", "up", "down", "delay"]));
        assert!(!pattern.matches_exact(&["green-flag", "up"]));
    }
}
