//! Capability checks for acting on an idea.

use crate::{
  idea::{Comment, Idea, IdeaStatus},
  survey::Survey,
  user::{Actor, UserRole},
};

fn is_author(idea: &Idea, actor: &Actor) -> bool {
  idea.author_id == actor.user_id
}

/// The author, a project manager or an admin may edit an idea's checklist.
pub fn can_edit_checklist(idea: &Idea, actor: &Actor) -> bool {
  is_author(idea, actor) || actor.role.is_privileged()
}

/// Whether `actor` may move `idea` from `from` to `to`.
///
/// Same audience as [`can_edit_checklist`], except that leaving `COMPLETED`
/// requires a privileged role even for the author.
pub fn can_change_status(
  idea: &Idea,
  actor: &Actor,
  from: IdeaStatus,
  to: IdeaStatus,
) -> bool {
  if !can_edit_checklist(idea, actor) {
    return false;
  }
  let reopening = from == IdeaStatus::Completed && to != IdeaStatus::Completed;
  !reopening || actor.role.is_privileged()
}

/// Only administrators delete ideas.
pub fn can_delete_idea(actor: &Actor) -> bool { actor.role == UserRole::Admin }

/// A comment's author, or an admin.
pub fn can_delete_comment(comment: &Comment, actor: &Actor) -> bool {
  comment.author_id == actor.user_id || actor.role == UserRole::Admin
}

/// A survey's creator, or an admin, may close or delete it.
pub fn can_manage_survey(survey: &Survey, actor: &Actor) -> bool {
  survey.creator_id == actor.user_id || actor.role == UserRole::Admin
}
