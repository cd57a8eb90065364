//! XP grants and level tracking.
//!
//! XP is paid by the store inside the same unit of work as the write that
//! earned it (see [`XpGrant`]), so an award can neither outlive a failed
//! write nor be lost after a successful one. The ledger decides how much a
//! grant is worth and which level table it is measured against.

use ideaboard_core::{
  level::LevelTable,
  store::XpGrant,
  user::{User, UserProgress},
};
use tracing::{debug, info};

pub use ideaboard_core::user::XpAward;

#[derive(Debug, Clone, Default)]
pub struct XpLedger {
  levels: LevelTable,
}

impl XpLedger {
  pub fn new(levels: LevelTable) -> Self { Self { levels } }

  pub fn levels(&self) -> &LevelTable { &self.levels }

  /// A grant of `amount` XP measured against this ledger's level table.
  pub fn grant(&self, amount: u32) -> XpGrant {
    XpGrant { amount, levels: self.levels.clone() }
  }

  /// Log an award the store has committed.
  pub fn record(&self, award: &XpAward) {
    let change = &award.change;
    debug!(
      user_id = %change.user_id,
      amount = change.xp_after - change.xp_before,
      xp = change.xp_after,
      level = award.level,
      "xp awarded"
    );
    if award.leveled_up {
      info!(user_id = %change.user_id, level = award.level, "level up");
    }
  }

  pub fn progress(&self, user: &User) -> UserProgress {
    UserProgress {
      user_id:               user.user_id,
      xp_points:             user.xp_points,
      level:                 self.levels.level_for(user.xp_points),
      next_level_xp:         self.levels.next_threshold(user.xp_points),
      progress_within_level: self.levels.progress_within_level(user.xp_points),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use ideaboard_core::user::UserRole;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn grants_carry_the_ledger_table() {
    let levels = LevelTable::new(vec![0, 10, 20]).unwrap();
    let ledger = XpLedger::new(levels.clone());
    let grant = ledger.grant(15);
    assert_eq!(grant.amount, 15);
    assert_eq!(grant.levels, levels);
    assert_eq!(grant.levels.level_for(15), 2);
  }

  #[test]
  fn progress_is_derived_from_xp() {
    let ledger = XpLedger::default();
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   "ada".into(),
      role:       UserRole::Employee,
      xp_points:  150,
      level:      2,
      created_at: Utc::now(),
    };
    let progress = ledger.progress(&user);
    assert_eq!(progress.level, 2);
    assert_eq!(progress.next_level_xp, Some(300));
    assert_eq!(progress.progress_within_level, 25);
  }
}
