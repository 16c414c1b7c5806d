//! Block types.
//!
//! A [`Block`] is one visual program unit. Blocks form chains through their
//! `parent_id` / `child_id` links; the chain head is the block whose
//! `parent_id` is `None`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest value a delay block can be set to from the editor.
pub const DELAY_MIN: u32 = 1;
/// Largest value a delay block can be set to from the editor.
pub const DELAY_MAX: u32 = 10;

/// Unique identifier for a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of a block.
///
/// Names outside the known set are kept verbatim in [`BlockType::Other`] so
/// that snapshots from newer editors still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Up,
    Down,
    Delay,
    GreenFlag,
    Forward,
    Backward,
    Clockwise,
    CountClockwise,
    LampOn,
    LampOff,
    SpeedLow,
    SpeedHigh,
    Shoot,
    Other(String),
}

impl BlockType {
    /// Every named block type, in palette order.
    pub const KNOWN: [BlockType; 13] = [
        BlockType::GreenFlag,
        BlockType::Up,
        BlockType::Down,
        BlockType::Delay,
        BlockType::Forward,
        BlockType::Backward,
        BlockType::Clockwise,
        BlockType::CountClockwise,
        BlockType::LampOn,
        BlockType::LampOff,
        BlockType::SpeedLow,
        BlockType::SpeedHigh,
        BlockType::Shoot,
    ];

    /// The wire name of this type, as stored in `blocks.json`.
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Up => "up",
            BlockType::Down => "down",
            BlockType::Delay => "delay",
            BlockType::GreenFlag => "green-flag",
            BlockType::Forward => "forward",
            BlockType::Backward => "backward",
            BlockType::Clockwise => "clockwise",
            BlockType::CountClockwise => "countclockwise",
            BlockType::LampOn => "lamp-on",
            BlockType::LampOff => "lamp-off",
            BlockType::SpeedLow => "speed-low",
            BlockType::SpeedHigh => "speed-high",
            BlockType::Shoot => "shoot",
            BlockType::Other(name) => name,
        }
    }

    /// Whether this type absorbs the values of the delay blocks that
    /// immediately follow it.
    pub fn consumes_delay(&self) -> bool {
        matches!(
            self,
            BlockType::Up
                | BlockType::Down
                | BlockType::Forward
                | BlockType::Backward
                | BlockType::Clockwise
                | BlockType::CountClockwise
                | BlockType::LampOn
                | BlockType::LampOff
        )
    }

    /// Fixed speed percentage for the speed blocks.
    pub fn fixed_speed(&self) -> Option<u32> {
        match self {
            BlockType::SpeedLow => Some(50),
            BlockType::SpeedHigh => Some(100),
            _ => None,
        }
    }

    pub fn is_speed(&self) -> bool {
        self.fixed_speed().is_some()
    }

    pub fn is_delay(&self) -> bool {
        matches!(self, BlockType::Delay)
    }
}

impl FromStr for BlockType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BlockType::KNOWN
            .iter()
            .find(|t| t.as_str() == s)
            .cloned()
            .unwrap_or_else(|| BlockType::Other(s.to_string())))
    }
}

impl From<String> for BlockType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for BlockType {
    fn from(s: &str) -> Self {
        BlockType::from(s.to_string())
    }
}

impl From<BlockType> for String {
    fn from(t: BlockType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single block on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Numeric payload; only meaningful for delay blocks.
    #[serde(
        default,
        deserialize_with = "lenient_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<u32>,
    /// Canvas position; ignored by everything except rendering.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub child_id: Option<BlockId>,
}

impl Block {
    /// Create an unlinked block at the origin.
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<BlockType>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            value: None,
            x: 0.0,
            y: 0.0,
            parent_id: None,
            child_id: None,
        }
    }

    /// Create an unlinked delay block with the given value.
    pub fn delay(id: impl Into<BlockId>, value: u32) -> Self {
        Self::new(id, BlockType::Delay).with_value(value)
    }

    pub fn with_value(mut self, value: u32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<BlockId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<BlockId>) -> Self {
        self.child_id = Some(child.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// The number of delay units this block stands for; absent values count as 1.
    pub fn delay_units(&self) -> u32 {
        self.value.unwrap_or(1)
    }

    /// Whether this block starts a chain.
    pub fn is_head(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Accepts any JSON number that is a non-negative integer; every other
/// shape (strings, null, fractions, negatives) reads as "absent".
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_from_json))
}

fn value_from_json(raw: &serde_json::Value) -> Option<u32> {
    let serde_json::Value::Number(number) = raw else {
        return None;
    };
    if let Some(n) = number.as_u64() {
        return u32::try_from(n).ok();
    }
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
        .map(|f| f as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_names_round_trip() {
        for t in BlockType::KNOWN.iter() {
            assert_eq!(&BlockType::from(t.as_str()), t);
        }
        assert_eq!(
            BlockType::from("teleport"),
            BlockType::Other("teleport".to_string())
        );
    }

    #[test]
    fn test_delay_consumers() {
        assert!(BlockType::Up.consumes_delay());
        assert!(BlockType::LampOff.consumes_delay());
        assert!(!BlockType::SpeedLow.consumes_delay());
        assert!(!BlockType::Delay.consumes_delay());
        assert!(!BlockType::GreenFlag.consumes_delay());
        assert_eq!(BlockType::SpeedHigh.fixed_speed(), Some(100));
    }

    #[test]
    fn test_deserialize_app_snapshot() {
        let json = r#"{"id":"b1","type":"delay","value":3,"x":10,"y":20,
            "parentId":"b0","childId":null}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.id, BlockId::from("b1"));
        assert_eq!(block.block_type, BlockType::Delay);
        assert_eq!(block.value, Some(3));
        assert_eq!(block.parent_id, Some(BlockId::from("b0")));
        assert_eq!(block.child_id, None);
    }

    #[test]
    fn test_lenient_value() {
        let cases = [
            (r#"{"id":"a","type":"delay","value":"2"}"#, None),
            (r#"{"id":"a","type":"delay","value":null}"#, None),
            (r#"{"id":"a","type":"delay","value":1.5}"#, None),
            (r#"{"id":"a","type":"delay","value":-4}"#, None),
            (r#"{"id":"a","type":"delay","value":4.0}"#, Some(4)),
            (r#"{"id":"a","type":"delay"}"#, None),
        ];
        for (json, expected) in cases {
            let block: Block = serde_json::from_str(json).unwrap();
            assert_eq!(block.value, expected, "{}", json);
        }
    }

    #[test]
    fn test_fractional_delay_counts_as_one_unit() {
        let json = r#"{"id":"d","type":"delay","value":1.5}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.value, None);
        assert_eq!(block.delay_units(), 1);
    }

    #[test]
    fn test_delay_units_default() {
        assert_eq!(Block::new("d", BlockType::Delay).delay_units(), 1);
        assert_eq!(Block::delay("d", 7).delay_units(), 7);
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let block = Block::new("b1", BlockType::GreenFlag).with_child("b2");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "green-flag");
        assert_eq!(json["childId"], "b2");
        assert!(json["parentId"].is_null());
        assert!(json.get("value").is_none());
    }
}
