//! The XP → level threshold table.

use std::sync::Arc;

use crate::{Error, Result};

/// Cumulative XP required to reach levels 1 through 10.
pub const STANDARD_THRESHOLDS: [u32; 10] =
  [0, 100, 300, 600, 1000, 1500, 2500, 4000, 6000, 10000];

/// An immutable, strictly increasing list of XP thresholds starting at 0.
///
/// `level_for(xp)` is one plus the index of the highest threshold not above
/// `xp`. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
  thresholds: Arc<[u32]>,
}

impl LevelTable {
  pub fn new(thresholds: impl Into<Vec<u32>>) -> Result<Self> {
    let thresholds = thresholds.into();
    if thresholds.first() != Some(&0) {
      return Err(Error::Validation(
        "level thresholds must start at 0".into(),
      ));
    }
    if thresholds.windows(2).any(|w| w[0] >= w[1]) {
      return Err(Error::Validation(
        "level thresholds must be strictly increasing".into(),
      ));
    }
    Ok(Self { thresholds: thresholds.into() })
  }

  pub fn standard() -> Self {
    Self { thresholds: Arc::new(STANDARD_THRESHOLDS) }
  }

  pub fn max_level(&self) -> u32 { self.thresholds.len() as u32 }

  pub fn level_for(&self, xp: u32) -> u32 {
    // Number of thresholds <= xp; the first threshold is 0 so this is >= 1.
    self.thresholds.partition_point(|&t| t <= xp) as u32
  }

  /// XP needed to reach `level`, or `None` past the top of the table.
  pub fn threshold_of(&self, level: u32) -> Option<u32> {
    let index = level.checked_sub(1)? as usize;
    self.thresholds.get(index).copied()
  }

  /// XP needed for the level after the one `xp` falls in.
  pub fn next_threshold(&self, xp: u32) -> Option<u32> {
    self.threshold_of(self.level_for(xp) + 1)
  }

  /// Percentage of the way from the current level's threshold to the next
  /// one, rounded down. 100 at the maximum level.
  pub fn progress_within_level(&self, xp: u32) -> u8 {
    let level = self.level_for(xp);
    let (Some(floor), Some(ceiling)) =
      (self.threshold_of(level), self.threshold_of(level + 1))
    else {
      return 100;
    };
    let earned = u64::from(xp - floor);
    let span = u64::from(ceiling - floor);
    (earned * 100 / span) as u8
  }
}

impl Default for LevelTable {
  fn default() -> Self { Self::standard() }
}
