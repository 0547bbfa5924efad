/// Snapshot slot domain types.
///
/// The mixer exposes 64 snapshot slots. Users (and the mixer's own UI)
/// number them 1..=64; the `/-snap/load` wire argument may be offset
/// depending on firmware, which is what `IndexBase` captures.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FIRST_SNAPSHOT, LAST_SNAPSHOT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("snapshot {value} out of range ({}-{})", FIRST_SNAPSHOT, LAST_SNAPSHOT)]
    OutOfRange { value: i64 },
    #[error("snapshot name is empty")]
    EmptyName,
}

/// A validated, 1-based snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct SnapshotIndex(u8);

impl SnapshotIndex {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < FIRST_SNAPSHOT as i64 || value > LAST_SNAPSHOT as i64 {
            return Err(ValidationError::OutOfRange { value });
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u32 {
        self.0 as u32
    }

    /// All slots in ascending order.
    pub fn all() -> impl Iterator<Item = SnapshotIndex> {
        (FIRST_SNAPSHOT as u8..=LAST_SNAPSHOT as u8).map(SnapshotIndex)
    }
}

impl TryFrom<i64> for SnapshotIndex {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SnapshotIndex> for u32 {
    fn from(index: SnapshotIndex) -> u32 {
        index.get()
    }
}

impl fmt::Display for SnapshotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trimmed, non-empty snapshot label as reported by the mixer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SnapshotName(String);

impl SnapshotName {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Offset between user-facing slot numbers and the `/-snap/load` argument.
///
/// Firmware revisions disagree on this, so it is configuration rather than
/// a constant. Verify against the actual mixer before changing the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    /// Slot 1 is sent as 0
    #[default]
    ZeroBased,
    /// Slot 1 is sent as 1
    OneBased,
}

impl IndexBase {
    fn offset(self) -> i32 {
        match self {
            Self::ZeroBased => 1,
            Self::OneBased => 0,
        }
    }

    pub fn to_wire(self, index: SnapshotIndex) -> i32 {
        index.get() as i32 - self.offset()
    }

    pub fn from_wire(self, wire: i32) -> Result<SnapshotIndex, ValidationError> {
        SnapshotIndex::new(wire as i64 + self.offset() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_bounds() {
        assert!(SnapshotIndex::new(1).is_ok());
        assert!(SnapshotIndex::new(64).is_ok());
        assert_eq!(
            SnapshotIndex::new(0),
            Err(ValidationError::OutOfRange { value: 0 })
        );
        assert!(SnapshotIndex::new(65).is_err());
        assert!(SnapshotIndex::new(-3).is_err());
    }

    #[test]
    fn all_covers_domain_in_order() {
        let all: Vec<u32> = SnapshotIndex::all().map(SnapshotIndex::get).collect();
        assert_eq!(all.len(), 64);
        assert_eq!(all.first(), Some(&1));
        assert_eq!(all.last(), Some(&64));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(SnapshotName::new("  Wide \n").unwrap().as_str(), "Wide");
        assert_eq!(SnapshotName::new("   "), Err(ValidationError::EmptyName));
        assert_eq!(SnapshotName::new(""), Err(ValidationError::EmptyName));
    }

    #[test]
    fn zero_based_offset() {
        let base = IndexBase::ZeroBased;
        let first = SnapshotIndex::new(1).unwrap();
        let last = SnapshotIndex::new(64).unwrap();
        assert_eq!(base.to_wire(first), 0);
        assert_eq!(base.to_wire(last), 63);
        assert_eq!(base.from_wire(0), Ok(first));
        assert!(base.from_wire(64).is_err());
        assert!(base.from_wire(-1).is_err());
    }

    #[test]
    fn one_based_offset() {
        let base = IndexBase::OneBased;
        let first = SnapshotIndex::new(1).unwrap();
        assert_eq!(base.to_wire(first), 1);
        assert_eq!(base.from_wire(64), Ok(SnapshotIndex::new(64).unwrap()));
        assert!(base.from_wire(0).is_err());
    }

    #[test]
    fn default_base_is_zero_based() {
        assert_eq!(IndexBase::default(), IndexBase::ZeroBased);
    }
}
