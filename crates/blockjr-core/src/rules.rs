//! Validation rule-book schema.
//!
//! A rule book maps a chapter key to the list of patterns that count as a
//! solution for that chapter. Each pattern is an ordered list of raw tokens:
//! either a block type name (`"green-flag"`) or a slash-delimited regular
//! expression (`"/^green[- ]?flag$/i"`). Tokens are compiled by the
//! validator, not here.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One pattern: raw tokens, matched position by position.
pub type RawPattern = Vec<String>;

/// The accepted patterns for a single chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRules {
    /// Alternative patterns; matching any one of them is enough.
    pub states: Vec<RawPattern>,
    /// Optional allow-list of block types. Exact-length validation drops
    /// every other type from a chain before comparing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_types: Option<Vec<String>>,
}

impl ChapterRules {
    pub fn new(states: Vec<RawPattern>) -> Self {
        Self {
            states,
            block_types: None,
        }
    }

    pub fn with_block_types(mut self, types: Vec<String>) -> Self {
        self.block_types = Some(types);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Chapter key to accepted patterns, e.g. `{"chapter-01": [["green-flag", "up"]]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleBook {
    chapters: BTreeMap<String, Vec<RawPattern>>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, chapter: impl Into<String>, patterns: Vec<RawPattern>) {
        self.chapters.insert(chapter.into(), patterns);
    }

    /// The patterns for `chapter`, if the chapter exists.
    pub fn patterns(&self, chapter: &str) -> Option<&[RawPattern]> {
        self.chapters.get(chapter).map(Vec::as_slice)
    }

    /// Chapter keys in sorted order.
    pub fn chapters(&self) -> impl Iterator<Item = (&str, &[RawPattern])> {
        self.chapters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
