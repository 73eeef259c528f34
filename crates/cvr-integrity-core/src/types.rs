//! Strong type definitions for cast vote record identifiers.
//!
//! A record id is also the name of the directory its files are exported to,
//! so it must never contain a path separator. Holding a [`CastVoteRecordId`]
//! is proof that this has been checked.

use std::fmt;
use std::path::is_separator;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Number of characters in a cast vote record id.
pub const CAST_VOTE_RECORD_ID_LENGTH: usize = 36;

/// A validated cast vote record id (36 characters, no path separators).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CastVoteRecordId(String);

impl CastVoteRecordId {
    /// Validate and wrap an id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.chars().count() != CAST_VOTE_RECORD_ID_LENGTH {
            return Err(CoreError::InvalidRecordId {
                id,
                reason: "must be exactly 36 characters",
            });
        }
        if id.chars().any(is_separator) {
            return Err(CoreError::InvalidRecordId {
                id,
                reason: "must not contain a path separator",
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first character, routing the record to a level-1 aggregate.
    pub fn level1_prefix(&self) -> Level1Prefix {
        // Validation guarantees 36 characters.
        let first = self.0.chars().next().unwrap_or_default();
        Level1Prefix(first)
    }

    /// The first two characters, routing the record to a level-2 aggregate.
    pub fn level2_prefix(&self) -> Level2Prefix {
        let mut chars = self.0.chars();
        let first = chars.next().unwrap_or_default();
        let second = chars.next().unwrap_or_default();
        Level2Prefix([first, second])
    }
}

impl fmt::Debug for CastVoteRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastVoteRecordId({})", self.0)
    }
}

impl fmt::Display for CastVoteRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CastVoteRecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CastVoteRecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CastVoteRecordId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

/// The one-character prefix shared by all records under a level-1 aggregate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level1Prefix(char);

impl Level1Prefix {
    pub fn new(c: char) -> Self {
        Self(c)
    }

    /// Parse from a string holding exactly one character.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self(c)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl fmt::Debug for Level1Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level1Prefix({})", self.0)
    }
}

impl fmt::Display for Level1Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two-character prefix shared by all records under a level-2 aggregate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level2Prefix([char; 2]);

impl Level2Prefix {
    pub fn new(first: char, second: char) -> Self {
        Self([first, second])
    }

    /// Parse from a string holding exactly two characters.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => Some(Self([a, b])),
            _ => None,
        }
    }

    /// The level-1 prefix this level-2 prefix falls under.
    pub fn level1(&self) -> Level1Prefix {
        Level1Prefix(self.0[0])
    }
}

impl fmt::Debug for Level2Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level2Prefix({}{})", self.0[0], self.0[1])
    }
}

impl fmt::Display for Level2Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0], self.0[1])
    }
}
