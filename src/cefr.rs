//! CEFR proficiency levels.
//!
//! The six bands of the Common European Framework of Reference, A1 (lowest)
//! to C2 (highest). Variant order is the proficiency order, so the derived
//! `Ord` is what the band filter uses for "at or above" comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CEFR proficiency band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum CefrLevel {
    A1,
    A2,
    /// Default target level for new decks.
    #[default]
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels in ascending order.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// Zero-based position in [`CefrLevel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// `true` when `self` is at or above `threshold`.
    pub fn meets(self, threshold: CefrLevel) -> bool {
        self >= threshold
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the six CEFR labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a CEFR level (expected A1, A2, B1, B2, C1 or C2)")]
pub struct ParseCefrLevelError(pub String);

impl FromStr for CefrLevel {
    type Err = ParseCefrLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            _ => Err(ParseCefrLevelError(s.to_string())),
        }
    }
}
