//! Identifiers and value types shared by every context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of truths and of dares each player completes per level.
pub const PROMPTS_PER_TYPE_PER_LEVEL: u32 = 5;

/// Prompts completed by both players together to clear one level.
pub const LEVEL_PROMPT_TOTAL: u32 = PROMPTS_PER_TYPE_PER_LEVEL * 2 * 2;

/// Session-scoped player identifier (`player1` or `player2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog-scoped prompt identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(String);

impl PromptId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Player gender, used to scope prompt selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

/// Kind of challenge a prompt poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    Truth,
    Dare,
}

impl PromptType {
    /// The other prompt type.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Truth => Self::Dare,
            Self::Dare => Self::Truth,
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truth => f.write_str("truth"),
            Self::Dare => f.write_str("dare"),
        }
    }
}

/// Content tier, always within `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    /// The level every game starts at.
    pub const FIRST: Self = Self(1);
    /// The final level; advancing past it completes the game.
    pub const MAX: Self = Self(3);

    /// Creates a level.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is outside `1..=3`.
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (Self::FIRST.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::Validation(format!(
                "level must be between {} and {}, got {value}",
                Self::FIRST.0,
                Self::MAX.0
            )))
        }
    }

    /// Returns the numeric level.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// The following level, or `None` at the final level.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        (self < Self::MAX).then(|| Self(self.0 + 1))
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for Level {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of the adults-only confirmation shown before setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGateDecision {
    /// No answer yet; the only state in which the gate is shown.
    #[default]
    Undecided,
    Allowed,
    Denied,
}

/// One of the two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub gender: Gender,
    pub truths_completed: u32,
    pub dares_completed: u32,
}

impl Player {
    /// Creates a player with zeroed counters.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            truths_completed: 0,
            dares_completed: 0,
        }
    }

    /// Completed count for the given prompt type.
    #[must_use]
    pub fn completed(&self, prompt_type: PromptType) -> u32 {
        match prompt_type {
            PromptType::Truth => self.truths_completed,
            PromptType::Dare => self.dares_completed,
        }
    }

    /// Whether the player may still take a prompt of this type at this level.
    #[must_use]
    pub fn can_take(&self, prompt_type: PromptType) -> bool {
        self.completed(prompt_type) < PROMPTS_PER_TYPE_PER_LEVEL
    }

    /// Whether both counters have reached the per-level cap.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        !self.can_take(PromptType::Truth) && !self.can_take(PromptType::Dare)
    }
}

/// An immutable challenge from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub text: String,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub gender: Gender,
    pub level: Level,
}
