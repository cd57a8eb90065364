//! Notification content and targeting.
//!
//! Each builder returns the single notification an event produces for one
//! recipient. Whether to send it at all is decided by the engine.

use ideaboard_core::{
  group::IdeaGroup,
  idea::{Comment, Idea, IdeaStatus},
  notification::{Notification, NotificationKind},
  user::{Badge, User},
};
use uuid::Uuid;

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
  if text.chars().count() <= max {
    return text.to_owned();
  }
  let kept: String = text.chars().take(max.saturating_sub(3)).collect();
  format!("{kept}...")
}

fn idea_link(idea_id: Uuid) -> Option<String> {
  Some(format!("/ideas/{idea_id}"))
}

fn group_link(group_id: Uuid) -> Option<String> {
  Some(format!("/messages?group={group_id}"))
}

pub fn liked(idea: &Idea, liker: &User) -> Notification {
  Notification {
    target_user:         idea.author_id,
    kind:                NotificationKind::Like,
    title:               "New like".into(),
    message:             format!(
      "{} liked your idea \"{}\"",
      liker.username,
      truncate(&idea.title, 50)
    ),
    link:                idea_link(idea.idea_id),
    source_user:         Some(liker.user_id),
    related_entity_type: Some("Idea".into()),
    related_entity_id:   Some(idea.idea_id),
  }
}

pub fn commented(idea: &Idea, commenter: &User, content: &str) -> Notification {
  Notification {
    target_user:         idea.author_id,
    kind:                NotificationKind::Comment,
    title:               "New comment".into(),
    message:             format!(
      "{} commented on \"{}\": {}",
      commenter.username,
      truncate(&idea.title, 30),
      truncate(content, 50)
    ),
    link:                idea_link(idea.idea_id),
    source_user:         Some(commenter.user_id),
    related_entity_type: Some("Idea".into()),
    related_entity_id:   Some(idea.idea_id),
  }
}

pub fn reacted(comment: &Comment, reactor: &User, emoji: &str) -> Notification {
  Notification {
    target_user:         comment.author_id,
    kind:                NotificationKind::Reaction,
    title:               "New reaction".into(),
    message:             format!("{} reacted {emoji} to your comment", reactor.username),
    link:                idea_link(comment.idea_id),
    source_user:         Some(reactor.user_id),
    related_entity_type: Some("Comment".into()),
    related_entity_id:   Some(comment.comment_id),
  }
}

pub fn status_changed(idea: &Idea, to: IdeaStatus, by: &User) -> Notification {
  Notification {
    target_user:         idea.author_id,
    kind:                NotificationKind::StatusChange,
    title:               "Status updated".into(),
    message:             format!(
      "The status of your idea \"{}\" changed to {}",
      truncate(&idea.title, 30),
      to.label()
    ),
    link:                idea_link(idea.idea_id),
    source_user:         Some(by.user_id),
    related_entity_type: Some("Idea".into()),
    related_entity_id:   Some(idea.idea_id),
  }
}

pub fn badge_earned(user_id: Uuid, badge: &Badge) -> Notification {
  Notification {
    target_user:         user_id,
    kind:                NotificationKind::BadgeEarned,
    title:               "Badge earned!".into(),
    message:             format!(
      "Congratulations! You earned the \"{}\" badge",
      badge.display_name
    ),
    link:                Some("/profile".into()),
    source_user:         None,
    related_entity_type: Some("Badge".into()),
    related_entity_id:   Some(badge.badge_id),
  }
}

pub fn level_up(user_id: Uuid, level: u32) -> Notification {
  Notification {
    target_user:         user_id,
    kind:                NotificationKind::LevelUp,
    title:               "Level up!".into(),
    message:             format!("Congratulations! You reached level {level}"),
    link:                Some("/profile".into()),
    source_user:         None,
    related_entity_type: None,
    related_entity_id:   None,
  }
}

pub fn member_joined(group: &IdeaGroup, joiner: &User) -> Notification {
  Notification {
    target_user:         group.created_by,
    kind:                NotificationKind::Message,
    title:               "New group member".into(),
    message:             format!(
      "{} joined the group \"{}\"",
      joiner.username,
      truncate(&group.name, 30)
    ),
    link:                group_link(group.group_id),
    source_user:         Some(joiner.user_id),
    related_entity_type: Some("IdeaGroup".into()),
    related_entity_id:   Some(group.group_id),
  }
}

pub fn group_message(
  group: &IdeaGroup,
  sender: &User,
  content: &str,
  recipient: Uuid,
) -> Notification {
  Notification {
    target_user:         recipient,
    kind:                NotificationKind::Message,
    title:               "New group message".into(),
    message:             format!(
      "{} in \"{}\": {}",
      sender.username,
      truncate(&group.name, 20),
      truncate(content, 50)
    ),
    link:                group_link(group.group_id),
    source_user:         Some(sender.user_id),
    related_entity_type: Some("IdeaGroup".into()),
    related_entity_id:   Some(group.group_id),
  }
}
