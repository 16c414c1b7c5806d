//! Rule books shipped with the toolchain.

use blockjr_core::{Result, RuleBook};

const ELEVATOR_RULES: &str = include_str!("../rules/elevator.json");

/// The elevator story's chapter rules (`chapter-01` to `chapter-16`).
pub fn elevator() -> Result<RuleBook> {
    RuleBook::from_json(ELEVATOR_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{MatchMode, Validator};
    use blockjr_core::{Block, BlockType};

    #[test]
    fn test_elevator_rules_parse() {
        let book = elevator().unwrap();
        assert_eq!(book.len(), 16);
        assert_eq!(book.patterns("chapter-01").unwrap().len(), 3);
        assert!(book.patterns("chapter-16").is_some());
        assert!(book.patterns("chapter-17").is_none());
    }

    #[test]
    fn test_elevator_chapter_one() {
        let validator = Validator::new(&elevator().unwrap());
        let blocks = vec![
            Block::new("f", BlockType::GreenFlag).with_child("d"),
            Block::new("d", BlockType::Down).with_parent("f").with_child("w"),
            Block::delay("w", 2).with_parent("d"),
        ];
        assert!(validator.validate(&blocks, "chapter-01", MatchMode::Subsequence));
        assert!(!validator.validate(&blocks, "chapter-02", MatchMode::Subsequence));
    }
}
