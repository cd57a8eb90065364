//! The idea progress state machine.
//!
//! ```text
//! CONCEPT ──(first checklist item completed)──▶ IN_PROGRESS
//!    ▲                                              │
//!    └──────────── explicit status change ◀─────────┤
//!                                                   ▼
//!                   (explicit status change)    COMPLETED
//! ```
//!
//! Progress is derived from the checklist. The only automatic transition is
//! CONCEPT → IN_PROGRESS on a toggle; completion is always an explicit
//! status change, and leaving COMPLETED requires a privileged role.

use serde::Serialize;

use crate::{
  Error, Result,
  idea::{ChecklistItem, Idea, IdeaStatus},
  policy,
  user::Actor,
};

/// `round(100 * completed / total)` with halves rounded up, or `None` for an
/// empty checklist.
pub fn percentage(completed: usize, total: usize) -> Option<u8> {
  if total == 0 {
    return None;
  }
  let completed = completed.min(total) as u64;
  let total = total as u64;
  Some(((200 * completed + total) / (2 * total)) as u8)
}

/// The state an idea should be in after a checklist mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
  pub progress_percentage:         u8,
  pub status:                      IdeaStatus,
  pub transitioned_to_in_progress: bool,
  /// Informational: every item is done. Never completes the idea by itself.
  pub all_todos_completed:         bool,
}

impl ProgressUpdate {
  fn unchanged(status: IdeaStatus, progress: u8) -> Self {
    Self {
      progress_percentage: progress,
      status,
      transitioned_to_in_progress: false,
      all_todos_completed: false,
    }
  }
}

/// Full recompute after a toggle: progress, the one-way CONCEPT →
/// IN_PROGRESS transition and the all-done signal.
pub fn recompute(
  status: IdeaStatus,
  current_progress: u8,
  completed: usize,
  total: usize,
) -> ProgressUpdate {
  let Some(progress) = percentage(completed, total) else {
    return ProgressUpdate::unchanged(status, current_progress);
  };

  let transitioned = status == IdeaStatus::Concept && completed > 0;
  ProgressUpdate {
    progress_percentage:         progress,
    status:                      if transitioned {
      IdeaStatus::InProgress
    } else {
      status
    },
    transitioned_to_in_progress: transitioned,
    all_todos_completed:         completed == total,
  }
}

/// Progress-only recompute after creating, renaming or deleting an item.
/// Status is left alone.
pub fn refresh(
  status: IdeaStatus,
  current_progress: u8,
  completed: usize,
  total: usize,
) -> ProgressUpdate {
  ProgressUpdate::unchanged(
    status,
    percentage(completed, total).unwrap_or(current_progress),
  )
}

/// [`recompute`] over a checklist snapshot.
pub fn recompute_from_checklist(
  idea: &Idea,
  items: &[ChecklistItem],
) -> ProgressUpdate {
  let completed = items.iter().filter(|i| i.is_completed).count();
  recompute(idea.status, idea.progress_percentage, completed, items.len())
}

/// Authorisation and lock check shared by every checklist mutation.
pub fn ensure_checklist_editable(idea: &Idea, actor: &Actor) -> Result<()> {
  if !policy::can_edit_checklist(idea, actor) {
    return Err(Error::Forbidden(
      "only the author, a project manager or an admin may edit the checklist"
        .into(),
    ));
  }
  if idea.status == IdeaStatus::Completed {
    return Err(Error::ChecklistLocked(idea.idea_id));
  }
  Ok(())
}

// ─── Explicit status changes ─────────────────────────────────────────────────

/// The effect of an authorised status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
  pub from:                IdeaStatus,
  pub to:                  IdeaStatus,
  /// Forced progress, or `None` to keep the checklist-derived value.
  pub progress_percentage: Option<u8>,
}

impl StatusChange {
  pub fn is_transition(&self) -> bool { self.from != self.to }

  /// Completion XP is paid once per actual move into COMPLETED.
  pub fn awards_completion(&self) -> bool {
    self.is_transition() && self.to == IdeaStatus::Completed
  }
}

/// Validate `actor` moving `idea` to `requested` and work out the effect.
pub fn plan_status_change(
  idea: &Idea,
  requested: IdeaStatus,
  actor: &Actor,
) -> Result<StatusChange> {
  if !policy::can_edit_checklist(idea, actor) {
    return Err(Error::Forbidden(
      "only the author, a project manager or an admin may change the status"
        .into(),
    ));
  }
  if !policy::can_change_status(idea, actor, idea.status, requested) {
    return Err(Error::InvalidOperation(
      "completed ideas can only be reopened by a project manager or admin"
        .into(),
    ));
  }

  let progress_percentage = match requested {
    IdeaStatus::Completed => Some(100),
    IdeaStatus::Concept => Some(0),
    IdeaStatus::InProgress => None,
  };

  Ok(StatusChange { from: idea.status, to: requested, progress_percentage })
}
