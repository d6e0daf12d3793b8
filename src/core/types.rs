//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for actors (the entity performing clicks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class identifier (lower-cased at the configuration boundary)
pub type ClassId = String;

/// Number of clicks in a complete combo
pub const COMBO_LEN: usize = 3;

/// The two kinds of click an actor can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickType {
    /// Left click ("L")
    Primary,
    /// Right click ("R")
    Secondary,
}

impl ClickType {
    pub fn as_char(self) -> char {
        match self {
            ClickType::Primary => 'L',
            ClickType::Secondary => 'R',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'L' => Some(ClickType::Primary),
            'R' => Some(ClickType::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for ClickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A complete three-click combo, the canonical lookup key for abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComboPattern(pub [ClickType; COMBO_LEN]);

impl ComboPattern {
    pub fn new(clicks: [ClickType; COMBO_LEN]) -> Self {
        Self(clicks)
    }

    /// Build a pattern from a slice, if it has exactly three clicks
    pub fn from_slice(clicks: &[ClickType]) -> Option<Self> {
        let arr: [ClickType; COMBO_LEN] = clicks.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn clicks(&self) -> &[ClickType] {
        &self.0
    }
}

impl fmt::Display for ComboPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for click in self.0 {
            write!(f, "{}", click)?;
        }
        Ok(())
    }
}

/// Error parsing a combo key such as "LRL" or "L,R,L"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParseError(pub String);

impl fmt::Display for PatternParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid combo '{}': expected three of L/R", self.0)
    }
}

impl std::error::Error for PatternParseError {}

impl FromStr for ComboPattern {
    type Err = PatternParseError;

    /// Accepts "LRL", "lrl", "L,R,L" and "L R L"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clicks: Option<Vec<ClickType>> = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',' && *c != '-')
            .map(ClickType::from_char)
            .collect();

        clicks
            .as_deref()
            .and_then(Self::from_slice)
            .ok_or_else(|| PatternParseError(s.to_string()))
    }
}

/// Render a partial click sequence for progress feedback ("L-R")
pub fn render_clicks(clicks: &[ClickType]) -> String {
    clicks
        .iter()
        .map(|c| c.as_char().to_string())
        .collect::<Vec<_>>()
        .join("-")
}
