//! Task validation against rule books.
//!
//! A chapter is solved when any of its patterns matches any chain on the
//! canvas. Two matching modes are kept apart on purpose:
//!
//! - [`MatchMode::Subsequence`]: the pattern appears as a contiguous run
//!   inside the chain;
//! - [`MatchMode::Exact`]: the chain, optionally filtered to a set of block
//!   types, has the pattern's length and matches position by position.
//!
//! Validation is read-only and never fails: unknown chapters, empty rule
//! sets and inert regex tokens all simply fail to match.

use crate::chain::validation_chains;
use crate::pattern::Pattern;
use blockjr_core::{Block, ChapterRules, RuleBook};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// How a pattern is compared against a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Subsequence,
    Exact,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subsequence" => Ok(MatchMode::Subsequence),
            "exact" => Ok(MatchMode::Exact),
            other => Err(format!("unknown match mode '{}'", other)),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Subsequence => f.write_str("subsequence"),
            MatchMode::Exact => f.write_str("exact"),
        }
    }
}

/// Type names of every validation chain.
fn chain_types(blocks: &[Block]) -> Vec<Vec<&str>> {
    validation_chains(blocks)
        .into_iter()
        .map(|chain| chain.into_iter().map(|b| b.block_type.as_str()).collect())
        .collect()
}

/// True if any pattern occurs contiguously in any chain.
pub fn validate_subsequence(blocks: &[Block], patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let chains = chain_types(blocks);
    patterns
        .iter()
        .any(|pattern| chains.iter().any(|types| pattern.matches_contiguous(types)))
}

/// True if any chain, filtered to `block_types` when given, matches any
/// pattern exactly.
pub fn validate_exact(
    blocks: &[Block],
    patterns: &[Pattern],
    block_types: Option<&[String]>,
) -> bool {
    if blocks.is_empty() || patterns.is_empty() {
        return false;
    }

    let allowed: Option<HashSet<&str>> = block_types
        .filter(|types| !types.is_empty())
        .map(|types| types.iter().map(String::as_str).collect());

    chain_types(blocks).into_iter().any(|mut types| {
        if let Some(allowed) = &allowed {
            types.retain(|t| allowed.contains(t));
        }
        patterns.iter().any(|pattern| pattern.matches_exact(&types))
    })
}

/// Exact-length validation against a directly supplied rule set.
pub fn validate_rules(blocks: &[Block], rules: &ChapterRules) -> bool {
    let patterns: Vec<Pattern> = rules
        .states
        .iter()
        .map(|s| Pattern::compile(s.as_slice()))
        .collect();
    validate_exact(blocks, &patterns, rules.block_types.as_deref())
}

/// A rule book with every pattern compiled once.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    chapters: BTreeMap<String, Vec<Pattern>>,
}

impl Validator {
    pub fn new(book: &RuleBook) -> Self {
        let chapters = book
            .chapters()
            .map(|(key, patterns)| {
                let compiled = patterns.iter().map(|p| Pattern::compile(p.as_slice())).collect();
                (key.to_string(), compiled)
            })
            .collect();
        Self { chapters }
    }

    pub fn has_chapter(&self, chapter: &str) -> bool {
        self.chapters.contains_key(chapter)
    }

    pub fn patterns(&self, chapter: &str) -> &[Pattern] {
        self.chapters.get(chapter).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Validate `blocks` for `chapter` in the given mode.
    pub fn validate(&self, blocks: &[Block], chapter: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Subsequence => self.validate_subsequence(blocks, chapter),
            MatchMode::Exact => self.validate_exact(blocks, chapter, None),
        }
    }

    pub fn validate_subsequence(&self, blocks: &[Block], chapter: &str) -> bool {
        validate_subsequence(blocks, self.patterns(chapter))
    }

    pub fn validate_exact(
        &self,
        blocks: &[Block],
        chapter: &str,
        block_types: Option<&[String]>,
    ) -> bool {
        validate_exact(blocks, self.patterns(chapter), block_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockjr_core::BlockType;

    /// Build a single linked chain from a list of types.
    fn chain(prefix: &str, types: &[&str]) -> Vec<Block> {
        let ids: Vec<String> = (0..types.len()).map(|i| format!("{}{}", prefix, i)).collect();
        types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut block = Block::new(ids[i].as_str(), BlockType::from(*t));
                if i > 0 {
                    block = block.with_parent(ids[i - 1].as_str());
                }
                if i + 1 < types.len() {
                    block = block.with_child(ids[i + 1].as_str());
                }
                block
            })
            .collect()
    }

    fn book() -> RuleBook {
        RuleBook::from_json(
            r#"{
                "chapter-01": [["green-flag", "up", "down"], ["/^green[- ]?flag$/i", "up"]],
                "chapter-02": [["/up(/", "up"], ["green-flag", "down"]],
                "chapter-03": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_subsequence_exact_chain() {
        let validator = Validator::new(&book());
        let blocks = chain("a", &["green-flag", "up", "down"]);
        assert!(validator.validate(&blocks, "chapter-01", MatchMode::Subsequence));
    }

    #[test]
    fn test_subsequence_longer_chain() {
        let patterns = vec![Pattern::compile(&["/^green[- ]?flag$/i", "up"])];
        let blocks = chain("a", &["green-flag", "up", "down", "delay"]);
        assert!(validate_subsequence(&blocks, &patterns));
        let blocks = chain("a", &["up", "green-flag", "delay", "up"]);
        assert!(!validate_subsequence(&blocks, &patterns));
    }

    #[test]
    fn test_subsequence_checks_each_chain() {
        let mut blocks = chain("a", &["green-flag", "down"]);
        blocks.extend(chain("b", &["delay", "green-flag", "up", "delay"]));
        let validator = Validator::new(&book());
        assert!(validator.validate_subsequence(&blocks, "chapter-01"));
    }

    #[test]
    fn test_exact_mode_requires_same_length() {
        let validator = Validator::new(&book());
        let blocks = chain("a", &["green-flag", "up", "down", "delay"]);
        assert!(validator.validate_subsequence(&blocks, "chapter-01"));
        assert!(!validator.validate_exact(&blocks, "chapter-01", None));

        let blocks = chain("a", &["green-flag", "up"]);
        assert!(validator.validate(&blocks, "chapter-01", MatchMode::Exact));
    }

    #[test]
    fn test_exact_mode_filters_block_types() {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let rules = ChapterRules::new(vec![strings(&["green-flag", "forward", "forward"])])
            .with_block_types(strings(&["green-flag", "forward"]));
        let blocks = chain("a", &["green-flag", "forward", "delay", "forward", "delay"]);
        assert!(validate_rules(&blocks, &rules));

        let unfiltered = ChapterRules::new(rules.states.clone());
        assert!(!validate_rules(&blocks, &unfiltered));
    }

    #[test]
    fn test_invalid_regex_does_not_block_other_patterns() {
        let validator = Validator::new(&book());
        assert!(!validator.validate_subsequence(&chain("a", &["up(", "up"]), "chapter-02"));
        assert!(validator.validate_subsequence(&chain("a", &["green-flag", "down"]), "chapter-02"));
    }

    #[test]
    fn test_unknown_or_empty_chapter_fails() {
        let validator = Validator::new(&book());
        let blocks = chain("a", &["green-flag", "up", "down"]);
        assert!(!validator.validate(&blocks, "chapter-99", MatchMode::Subsequence));
        assert!(!validator.validate(&blocks, "chapter-03", MatchMode::Subsequence));
        assert!(!validator.validate(&blocks, "chapter-03", MatchMode::Exact));
        assert!(!validator.has_chapter("chapter-99"));
    }

    #[test]
    fn test_no_blocks_fails() {
        let validator = Validator::new(&book());
        assert!(!validator.validate(&[], "chapter-01", MatchMode::Subsequence));
        assert!(!validator.validate(&[], "chapter-01", MatchMode::Exact));
    }

    #[test]
    fn test_headless_cycle_still_validates() {
        let blocks = vec![
            Block::new("f", BlockType::GreenFlag).with_parent("d").with_child("u"),
            Block::new("u", BlockType::Up).with_parent("f").with_child("d"),
            Block::new("d", BlockType::Down).with_parent("u").with_child("f"),
        ];
        let validator = Validator::new(&book());
        assert!(validator.validate_subsequence(&blocks, "chapter-01"));
        assert!(validator.validate_exact(&blocks, "chapter-01", None));
    }

    #[test]
    fn test_validation_is_repeatable() {
        let validator = Validator::new(&book());
        let blocks = chain("a", &["green-flag", "up"]);
        let first = validator.validate_subsequence(&blocks, "chapter-01");
        let second = validator.validate_subsequence(&blocks, "chapter-01");
        assert_eq!(first, second);
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("exact".parse::<MatchMode>(), Ok(MatchMode::Exact));
        assert_eq!(MatchMode::default(), MatchMode::Subsequence);
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
