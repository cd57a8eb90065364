//! Badge criteria.
//!
//! A criterion is a named, side-effect-free predicate over [`UserStats`].
//! The evaluator in `ideaboard-engine` knows nothing about individual
//! criteria; adding a badge means adding a catalogue row and an entry here.

use crate::user::UserStats;

pub const FIRST_IDEA: &str = "first_idea";
pub const POPULAR: &str = "popular";
pub const COMMENTATOR: &str = "commentator";

#[derive(Debug, Clone, Copy)]
pub struct BadgeCriterion {
  /// Matches `Badge::name` in the catalogue.
  pub name:      &'static str,
  pub predicate: fn(&UserStats) -> bool,
}

impl BadgeCriterion {
  pub fn is_met(&self, stats: &UserStats) -> bool { (self.predicate)(stats) }
}

pub fn standard_criteria() -> Vec<BadgeCriterion> {
  vec![
    BadgeCriterion {
      name:      FIRST_IDEA,
      predicate: |s| s.ideas_authored >= 1,
    },
    BadgeCriterion {
      name:      POPULAR,
      predicate: |s| s.likes_received >= 10,
    },
    BadgeCriterion {
      name:      COMMENTATOR,
      predicate: |s| s.comments_authored >= 50,
    },
  ]
}
