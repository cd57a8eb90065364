//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeDelta, Utc};
use ideaboard_core::{
  badge,
  group::GroupRole,
  idea::{IdeaStatus, NewIdea},
  level::LevelTable,
  notification::{Notification, NotificationKind, Notifier},
  progress,
  store::{
    ChecklistChange, ChecklistOutcome, EngagementStore, LikeInsert, QuotaWindow,
    ReactionInsert, SubmittedIdea, VoteOutcome, XpGrant,
  },
  survey::{NewSurvey, SurveyView, VoteRejection},
  user::{User, UserRole},
};
use proptest::prelude::*;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.add_user(name.into(), UserRole::Employee)
    .await
    .unwrap()
    .unwrap()
}

fn grant(amount: u32) -> XpGrant {
  XpGrant { amount, levels: LevelTable::standard() }
}

fn new_idea(author: &User, checklist: &[&str]) -> NewIdea {
  NewIdea {
    author_id:   author.user_id,
    title:       "Solar carports".into(),
    description: "Shade and power for the parking lot".into(),
    category:    "Sustainability".into(),
    tags:        vec!["energy".into()],
    checklist:   checklist.iter().map(|t| (*t).to_owned()).collect(),
  }
}

async fn idea(s: &SqliteStore, author: &User, checklist: &[&str]) -> SubmittedIdea {
  s.create_idea(new_idea(author, checklist), grant(50))
    .await
    .unwrap()
    .value
}

async fn survey(s: &SqliteStore, creator: &User, allow_multiple_votes: bool) -> SurveyView {
  s.create_survey(NewSurvey {
    creator_id: creator.user_id,
    question: "Where should the offsite be?".into(),
    description: None,
    options: vec!["Lake".into(), "Mountains".into(), "City".into()],
    is_anonymous: false,
    allow_multiple_votes,
  })
  .await
  .unwrap()
}

/// Make every `UPDATE OF {column} ON users` fail until the trigger is
/// dropped again.
async fn break_user_column(s: &SqliteStore, column: &'static str) {
  s.conn
    .call(move |conn| {
      conn.execute_batch(&format!(
        "CREATE TRIGGER broken_{column} BEFORE UPDATE OF {column} ON users
         BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;"
      ))?;
      Ok(())
    })
    .await
    .unwrap();
}

async fn repair_user_column(s: &SqliteStore, column: &'static str) {
  s.conn
    .call(move |conn| {
      conn.execute_batch(&format!("DROP TRIGGER broken_{column};"))?;
      Ok(())
    })
    .await
    .unwrap();
}

fn window(limit: u32) -> QuotaWindow {
  let now = Utc::now();
  QuotaWindow { since: now - TimeDelta::days(1), limit, now }
}

fn applied(outcome: ChecklistOutcome) -> ideaboard_core::store::ChecklistApplied {
  match outcome {
    ChecklistOutcome::Applied(a) => a,
    other => panic!("expected an applied change, got {other:?}"),
  }
}

// ─── Users, XP and badges ────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;
  let alice = s
    .add_user("alice".into(), UserRole::ProjectManager)
    .await
    .unwrap()
    .unwrap();

  let fetched = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");
  assert_eq!(fetched.role, UserRole::ProjectManager);
  assert_eq!(fetched.xp_points, 0);
  assert_eq!(fetched.level, 1);

  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn usernames_are_unique() {
  let s = store().await;
  user(&s, "alice").await;
  let again = s.add_user("alice".into(), UserRole::Admin).await.unwrap();
  assert!(again.is_none());
}

#[tokio::test]
async fn awards_report_both_sides_of_the_increment() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let first = s
    .create_idea(new_idea(&alice, &[]), grant(50))
    .await
    .unwrap()
    .award;
  assert_eq!(first.change.user_id, alice.user_id);
  assert_eq!((first.change.xp_before, first.change.xp_after), (0, 50));
  assert_eq!((first.level, first.leveled_up), (1, false));

  let idea_id = s
    .create_idea(new_idea(&alice, &[]), grant(0))
    .await
    .unwrap()
    .value
    .idea
    .idea_id;
  let second = s
    .insert_comment(idea_id, alice.user_id, "me again".into(), grant(60))
    .await
    .unwrap()
    .unwrap()
    .award;
  assert_eq!((second.change.xp_before, second.change.xp_after), (50, 110));
  assert_eq!(second.change.stored_level, 1);
  assert_eq!((second.level, second.leveled_up), (2, true));

  let stored = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!((stored.xp_points, stored.level), (110, 2));
}

#[tokio::test]
async fn likes_and_completions_pay_the_idea_author() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;

  let LikeInsert::Inserted { award, .. } = s
    .insert_like(bob.user_id, idea_id, window(3), grant(10))
    .await
    .unwrap()
  else {
    panic!("expected the like to be inserted");
  };
  assert_eq!(award.change.user_id, alice.user_id);
  assert_eq!(award.change.xp_after, 60);

  let written = s
    .set_idea_status(
      idea_id,
      IdeaStatus::Concept,
      IdeaStatus::Completed,
      Some(100),
      Some(grant(100)),
    )
    .await
    .unwrap()
    .unwrap();
  let award = written.award.unwrap();
  assert_eq!(award.change.user_id, alice.user_id);
  assert_eq!((award.change.xp_after, award.level, award.leveled_up), (160, 2, true));

  // A stale compare-and-set pays nothing.
  let stale = s
    .set_idea_status(
      idea_id,
      IdeaStatus::Concept,
      IdeaStatus::Completed,
      Some(100),
      Some(grant(100)),
    )
    .await
    .unwrap();
  assert!(stale.is_none());
  assert_eq!(s.get_user(alice.user_id).await.unwrap().unwrap().xp_points, 160);
  assert_eq!(s.get_user(bob.user_id).await.unwrap().unwrap().xp_points, 0);
}

#[tokio::test]
async fn concurrent_awards_cross_a_threshold_once() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let alice_id = alice.user_id;

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move {
        s.insert_comment(idea_id, alice_id, "+1".into(), grant(20)).await
      })
    })
    .collect();

  let mut level_ups = 0;
  for h in handles {
    let award = h.await.unwrap().unwrap().unwrap().award;
    assert_eq!(award.level, LevelTable::standard().level_for(award.change.xp_after));
    if award.leveled_up {
      level_ups += 1;
    }
  }
  assert_eq!(level_ups, 1);
  let stored = s.get_user(alice_id).await.unwrap().unwrap();
  assert_eq!((stored.xp_points, stored.level), (130, 2));
}

#[tokio::test]
async fn failed_xp_write_rolls_back_the_write_that_earned_it() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let w = window(3);

  break_user_column(&s, "xp_points").await;

  assert!(s.insert_like(bob.user_id, idea_id, w, grant(10)).await.is_err());
  assert!(!s.has_liked(bob.user_id, idea_id).await.unwrap());
  assert_eq!(s.count_likes_since(bob.user_id, w.since).await.unwrap(), 0);

  assert!(
    s.insert_comment(idea_id, bob.user_id, "lost".into(), grant(5))
      .await
      .is_err()
  );
  assert!(s.create_idea(new_idea(&alice, &["a"]), grant(50)).await.is_err());
  assert!(
    s.set_idea_status(
      idea_id,
      IdeaStatus::Concept,
      IdeaStatus::Completed,
      Some(100),
      Some(grant(100)),
    )
    .await
    .is_err()
  );

  let stored = s.get_idea(idea_id).await.unwrap().unwrap();
  assert_eq!(stored.like_count, 0);
  assert_eq!(stored.comment_count, 0);
  assert_eq!(stored.status, IdeaStatus::Concept);
  assert_eq!(s.user_stats(alice.user_id).await.unwrap().ideas_authored, 1);
  assert_eq!(s.get_user(alice.user_id).await.unwrap().unwrap().xp_points, 50);

  repair_user_column(&s, "xp_points").await;
  assert!(matches!(
    s.insert_like(bob.user_id, idea_id, w, grant(10)).await.unwrap(),
    LikeInsert::Inserted { .. }
  ));
  assert_eq!(s.count_likes_since(bob.user_id, w.since).await.unwrap(), 1);
}

#[tokio::test]
async fn failed_level_write_rolls_back_the_xp() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  idea(&s, &alice, &[]).await;

  break_user_column(&s, "level").await;
  // The second idea would take alice to 100 XP and level 2.
  assert!(s.create_idea(new_idea(&alice, &[]), grant(50)).await.is_err());

  let stored = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!((stored.xp_points, stored.level), (50, 1));
  assert_eq!(s.user_stats(alice.user_id).await.unwrap().ideas_authored, 1);

  repair_user_column(&s, "level").await;
  let award = s
    .create_idea(new_idea(&alice, &[]), grant(50))
    .await
    .unwrap()
    .award;
  assert_eq!((award.level, award.leveled_up), (2, true));
  let stored = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!((stored.xp_points, stored.level), (100, 2));
}

#[tokio::test]
async fn awards_to_missing_users_fail_the_write() {
  let s = store().await;
  let ghost = Uuid::new_v4();
  let alice = user(&s, "alice").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;

  assert!(
    s.insert_comment(idea_id, ghost, "boo".into(), grant(5))
      .await
      .is_err()
  );
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().comment_count, 0);
}

#[tokio::test]
async fn badge_catalogue_is_seeded() {
  let s = store().await;
  for name in [badge::FIRST_IDEA, badge::POPULAR, badge::COMMENTATOR] {
    let found = s.badge_by_name(name.into()).await.unwrap();
    assert!(found.is_some(), "missing catalogue entry {name}");
  }
  assert!(s.badge_by_name("nope".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn badges_are_granted_once() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let first = s
    .badge_by_name(badge::FIRST_IDEA.into())
    .await
    .unwrap()
    .unwrap();

  assert!(!s.has_badge(alice.user_id, first.badge_id).await.unwrap());
  assert!(
    s.grant_badge(alice.user_id, first.badge_id)
      .await
      .unwrap()
      .is_some()
  );
  assert!(
    s.grant_badge(alice.user_id, first.badge_id)
      .await
      .unwrap()
      .is_none()
  );
  assert!(s.has_badge(alice.user_id, first.badge_id).await.unwrap());
  assert_eq!(s.user_badges(alice.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn user_stats_aggregate_ideas_likes_and_comments() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let one = idea(&s, &alice, &[]).await;
  let two = idea(&s, &alice, &[]).await;

  s.insert_like(bob.user_id, one.idea.idea_id, window(3), grant(10))
    .await
    .unwrap();
  s.insert_like(bob.user_id, two.idea.idea_id, window(3), grant(10))
    .await
    .unwrap();
  s.insert_comment(one.idea.idea_id, alice.user_id, "thanks".into(), grant(5))
    .await
    .unwrap();

  let stats = s.user_stats(alice.user_id).await.unwrap();
  assert_eq!(stats.ideas_authored, 2);
  assert_eq!(stats.likes_received, 2);
  assert_eq!(stats.comments_authored, 1);

  let empty = s.user_stats(bob.user_id).await.unwrap();
  assert_eq!(empty.ideas_authored, 0);
  assert_eq!(empty.likes_received, 0);
}

// ─── Ideas and checklists ────────────────────────────────────────────────────

#[tokio::test]
async fn create_idea_builds_checklist_and_group() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let submitted = idea(&s, &alice, &["Survey", "Quote", "Install"]).await;

  let stored = s.get_idea(submitted.idea.idea_id).await.unwrap().unwrap();
  assert_eq!(stored.status, IdeaStatus::Concept);
  assert_eq!(stored.progress_percentage, 0);
  assert_eq!(stored.tags, vec!["energy".to_owned()]);

  let items = s.checklist(stored.idea_id).await.unwrap();
  let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
  assert_eq!(titles, ["Survey", "Quote", "Install"]);
  assert!(items.iter().all(|i| !i.is_completed));

  let group = s.group_for_idea(stored.idea_id).await.unwrap().unwrap();
  assert_eq!(group.group_id, submitted.group.group_id);
  let creator = s
    .membership(group.group_id, alice.user_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(creator.role, GroupRole::Creator);
}

#[tokio::test]
async fn views_are_counted_one_increment_at_a_time() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;

  let handles: Vec<_> = (0..5)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.increment_views(idea_id).await })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap().unwrap();
  }

  let viewed = s.increment_views(idea_id).await.unwrap().unwrap();
  assert_eq!(viewed.view_count, 6);
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().view_count, 6);
  assert!(s.increment_views(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn toggle_moves_concept_to_in_progress() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let submitted = idea(&s, &alice, &["a", "b"]).await;
  let item = submitted.checklist[0].item_id;

  let done = applied(
    s.apply_checklist_change(
      submitted.idea.idea_id,
      ChecklistChange::Toggle { item_id: item },
    )
    .await
    .unwrap(),
  );
  assert_eq!(done.idea.status, IdeaStatus::InProgress);
  assert_eq!(done.idea.progress_percentage, 50);
  assert!(done.update.transitioned_to_in_progress);
  assert!(done.item.unwrap().is_completed);
  // The stored outcome agrees with a recompute over the committed snapshot.
  let snapshot = s.checklist(submitted.idea.idea_id).await.unwrap();
  assert_eq!(
    done.update,
    progress::recompute_from_checklist(&submitted.idea, &snapshot)
  );

  let undone = applied(
    s.apply_checklist_change(
      submitted.idea.idea_id,
      ChecklistChange::Toggle { item_id: item },
    )
    .await
    .unwrap(),
  );
  assert_eq!(undone.idea.status, IdeaStatus::InProgress);
  assert_eq!(undone.idea.progress_percentage, 0);
  assert!(!undone.update.transitioned_to_in_progress);
}

#[tokio::test]
async fn structural_changes_refresh_progress_without_transitions() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let submitted = idea(&s, &alice, &["a"]).await;
  let idea_id = submitted.idea.idea_id;

  let added = applied(
    s.apply_checklist_change(idea_id, ChecklistChange::Create {
      title: "b".into(),
    })
    .await
    .unwrap(),
  );
  let new_item = added.item.unwrap();
  assert_eq!(new_item.ordinal_position, 1);
  assert_eq!(added.idea.status, IdeaStatus::Concept);

  applied(
    s.apply_checklist_change(idea_id, ChecklistChange::Toggle {
      item_id: new_item.item_id,
    })
    .await
    .unwrap(),
  );

  let renamed = applied(
    s.apply_checklist_change(idea_id, ChecklistChange::Rename {
      item_id: new_item.item_id,
      title:   "b2".into(),
    })
    .await
    .unwrap(),
  );
  assert_eq!(renamed.item.unwrap().title, "b2");
  assert_eq!(renamed.idea.progress_percentage, 50);

  let removed = applied(
    s.apply_checklist_change(idea_id, ChecklistChange::Delete {
      item_id: submitted.checklist[0].item_id,
    })
    .await
    .unwrap(),
  );
  assert!(removed.item.is_none());
  assert_eq!(removed.idea.progress_percentage, 100);
  // Everything done, but completion stays explicit.
  assert_eq!(removed.idea.status, IdeaStatus::InProgress);
}

#[tokio::test]
async fn deleting_the_last_item_keeps_progress() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let submitted = idea(&s, &alice, &["only"]).await;
  let item_id = submitted.checklist[0].item_id;

  applied(
    s.apply_checklist_change(submitted.idea.idea_id, ChecklistChange::Toggle {
      item_id,
    })
    .await
    .unwrap(),
  );
  let removed = applied(
    s.apply_checklist_change(submitted.idea.idea_id, ChecklistChange::Delete {
      item_id,
    })
    .await
    .unwrap(),
  );
  assert_eq!(removed.idea.progress_percentage, 100);
}

#[tokio::test]
async fn checklist_change_reports_missing_and_foreign_items() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let mine = idea(&s, &alice, &["a"]).await;
  let other = idea(&s, &alice, &["b"]).await;

  let foreign = s
    .apply_checklist_change(mine.idea.idea_id, ChecklistChange::Toggle {
      item_id: other.checklist[0].item_id,
    })
    .await
    .unwrap();
  assert!(matches!(foreign, ChecklistOutcome::ItemMissing));
  assert!(!s.checklist(other.idea.idea_id).await.unwrap()[0].is_completed);

  let missing = s
    .apply_checklist_change(Uuid::new_v4(), ChecklistChange::Create {
      title: "x".into(),
    })
    .await
    .unwrap();
  assert!(matches!(missing, ChecklistOutcome::IdeaMissing));
}

#[tokio::test]
async fn completed_ideas_refuse_checklist_changes() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let submitted = idea(&s, &alice, &["a"]).await;
  let idea_id = submitted.idea.idea_id;

  s.set_idea_status(idea_id, IdeaStatus::Concept, IdeaStatus::Completed, Some(100), None)
    .await
    .unwrap()
    .unwrap();

  let outcome = s
    .apply_checklist_change(idea_id, ChecklistChange::Toggle {
      item_id: submitted.checklist[0].item_id,
    })
    .await
    .unwrap();
  assert!(matches!(outcome, ChecklistOutcome::Locked));
  assert!(!s.checklist(idea_id).await.unwrap()[0].is_completed);
}

#[tokio::test]
async fn set_idea_status_is_compare_and_set() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;

  let stale = s
    .set_idea_status(
      idea_id,
      IdeaStatus::InProgress,
      IdeaStatus::Completed,
      Some(100),
      None,
    )
    .await
    .unwrap();
  assert!(stale.is_none());

  let moved = s
    .set_idea_status(idea_id, IdeaStatus::Concept, IdeaStatus::InProgress, None, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(moved.idea.status, IdeaStatus::InProgress);
  assert_eq!(moved.idea.progress_percentage, 0);
  assert!(moved.award.is_none());
}

#[tokio::test]
async fn delete_idea_cascades_but_keeps_quota_ledger() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let submitted = idea(&s, &alice, &["a"]).await;
  let idea_id = submitted.idea.idea_id;
  let w = window(3);

  s.insert_like(bob.user_id, idea_id, w, grant(10)).await.unwrap();
  s.insert_comment(idea_id, bob.user_id, "nice".into(), grant(5))
    .await
    .unwrap();

  assert!(s.delete_idea(idea_id).await.unwrap());
  assert!(!s.delete_idea(idea_id).await.unwrap());
  assert!(s.get_idea(idea_id).await.unwrap().is_none());
  assert!(s.checklist(idea_id).await.unwrap().is_empty());
  assert!(s.get_group(submitted.group.group_id).await.unwrap().is_none());
  assert!(!s.has_liked(bob.user_id, idea_id).await.unwrap());
  assert_eq!(s.count_likes_since(bob.user_id, w.since).await.unwrap(), 1);
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_insert_enforces_quota_and_uniqueness() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let ideas = [
    idea(&s, &alice, &[]).await.idea.idea_id,
    idea(&s, &alice, &[]).await.idea.idea_id,
    idea(&s, &alice, &[]).await.idea.idea_id,
    idea(&s, &alice, &[]).await.idea.idea_id,
  ];
  let w = window(3);

  assert!(matches!(
    s.insert_like(bob.user_id, ideas[0], w, grant(10)).await.unwrap(),
    LikeInsert::Inserted { .. }
  ));
  assert!(matches!(
    s.insert_like(bob.user_id, ideas[0], w, grant(10)).await.unwrap(),
    LikeInsert::Duplicate
  ));
  s.insert_like(bob.user_id, ideas[1], w, grant(10)).await.unwrap();
  s.insert_like(bob.user_id, ideas[2], w, grant(10)).await.unwrap();
  assert!(matches!(
    s.insert_like(bob.user_id, ideas[3], w, grant(10)).await.unwrap(),
    LikeInsert::QuotaExhausted
  ));
  assert!(matches!(
    s.insert_like(bob.user_id, Uuid::new_v4(), w, grant(10)).await.unwrap(),
    LikeInsert::IdeaMissing
  ));

  assert_eq!(s.get_idea(ideas[0]).await.unwrap().unwrap().like_count, 1);
  assert_eq!(s.get_idea(ideas[3]).await.unwrap().unwrap().like_count, 0);
  // Only the three inserted likes paid alice.
  assert_eq!(
    s.get_user(alice.user_id).await.unwrap().unwrap().xp_points,
    4 * 50 + 3 * 10
  );
}

#[tokio::test]
async fn unlike_decrements_but_never_refunds_quota() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let w = window(1);

  s.insert_like(bob.user_id, idea_id, w, grant(10)).await.unwrap();
  assert!(s.delete_like(bob.user_id, idea_id).await.unwrap());
  assert!(!s.delete_like(bob.user_id, idea_id).await.unwrap());
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().like_count, 0);

  assert_eq!(s.count_likes_since(bob.user_id, w.since).await.unwrap(), 1);
  assert!(matches!(
    s.insert_like(bob.user_id, idea_id, w, grant(10)).await.unwrap(),
    LikeInsert::QuotaExhausted
  ));
}

#[tokio::test]
async fn quota_only_counts_likes_inside_the_window() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let first = idea(&s, &alice, &[]).await.idea.idea_id;
  let second = idea(&s, &alice, &[]).await.idea.idea_id;

  let last_week = Utc::now() - TimeDelta::days(8);
  let old = QuotaWindow {
    since: last_week - TimeDelta::days(1),
    limit: 1,
    now:   last_week,
  };
  s.insert_like(bob.user_id, first, old, grant(10)).await.unwrap();

  assert!(matches!(
    s.insert_like(bob.user_id, second, window(1), grant(10))
      .await
      .unwrap(),
    LikeInsert::Inserted { .. }
  ));
}

#[tokio::test]
async fn concurrent_duplicate_likes_insert_once() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let bob_id = bob.user_id;
  let w = window(3);

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.insert_like(bob_id, idea_id, w, grant(10)).await })
    })
    .collect();

  let mut inserted = 0;
  for h in handles {
    if let LikeInsert::Inserted { .. } = h.await.unwrap().unwrap() {
      inserted += 1;
    }
  }
  assert_eq!(inserted, 1);
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().like_count, 1);
  assert_eq!(s.count_likes_since(bob_id, w.since).await.unwrap(), 1);
  assert_eq!(s.get_user(alice.user_id).await.unwrap().unwrap().xp_points, 60);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_move_the_counter_with_the_row() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;

  let comment = s
    .insert_comment(idea_id, alice.user_id, "first".into(), grant(5))
    .await
    .unwrap()
    .unwrap()
    .value;
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().comment_count, 1);
  assert_eq!(
    s.get_comment(comment.comment_id).await.unwrap().unwrap().content,
    "first"
  );

  assert!(s.delete_comment(comment.comment_id).await.unwrap());
  assert!(!s.delete_comment(comment.comment_id).await.unwrap());
  assert_eq!(s.get_idea(idea_id).await.unwrap().unwrap().comment_count, 0);

  assert!(
    s.insert_comment(Uuid::new_v4(), alice.user_id, "orphan".into(), grant(5))
      .await
      .unwrap()
      .is_none()
  );
  // The orphan paid nothing.
  assert_eq!(s.get_user(alice.user_id).await.unwrap().unwrap().xp_points, 55);
}

#[tokio::test]
async fn reactions_are_unique_per_emoji_and_counted() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let comment_id = s
    .insert_comment(idea_id, alice.user_id, "ship it".into(), grant(5))
    .await
    .unwrap()
    .unwrap()
    .value
    .comment_id;

  let ReactionInsert::Inserted(thumbs) = s
    .insert_reaction(comment_id, bob.user_id, "👍".into())
    .await
    .unwrap()
  else {
    panic!("expected the reaction to be inserted");
  };
  assert_eq!(thumbs.emoji, "👍");
  assert!(matches!(
    s.insert_reaction(comment_id, bob.user_id, "👍".into()).await.unwrap(),
    ReactionInsert::Duplicate
  ));
  s.insert_reaction(comment_id, bob.user_id, "🎉".into()).await.unwrap();
  s.insert_reaction(comment_id, alice.user_id, "👍".into()).await.unwrap();
  assert!(matches!(
    s.insert_reaction(Uuid::new_v4(), bob.user_id, "👍".into()).await.unwrap(),
    ReactionInsert::CommentMissing
  ));
  assert_eq!(
    s.get_comment(comment_id).await.unwrap().unwrap().reaction_count,
    3
  );

  assert!(s.delete_reaction(comment_id, bob.user_id, "👍".into()).await.unwrap());
  assert!(!s.delete_reaction(comment_id, bob.user_id, "👍".into()).await.unwrap());
  assert_eq!(
    s.get_comment(comment_id).await.unwrap().unwrap().reaction_count,
    2
  );
}

#[tokio::test]
async fn concurrent_duplicate_reactions_insert_once() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let idea_id = idea(&s, &alice, &[]).await.idea.idea_id;
  let comment_id = s
    .insert_comment(idea_id, alice.user_id, "ship it".into(), grant(5))
    .await
    .unwrap()
    .unwrap()
    .value
    .comment_id;
  let bob_id = bob.user_id;

  let handles: Vec<_> = (0..6)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.insert_reaction(comment_id, bob_id, "🔥".into()).await })
    })
    .collect();
  let mut inserted = 0;
  for h in handles {
    if let ReactionInsert::Inserted(_) = h.await.unwrap().unwrap() {
      inserted += 1;
    }
  }
  assert_eq!(inserted, 1);
  assert_eq!(
    s.get_comment(comment_id).await.unwrap().unwrap().reaction_count,
    1
  );
}

// ─── Surveys ─────────────────────────────────────────────────────────────────

fn cast(outcome: VoteOutcome) -> SurveyView {
  match outcome {
    VoteOutcome::Cast(view) => view,
    other => panic!("expected the vote to be cast, got {other:?}"),
  }
}

#[tokio::test]
async fn single_choice_surveys_take_one_vote() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let created = survey(&s, &alice, false).await;
  let survey_id = created.survey.survey_id;
  let options: Vec<Uuid> = created.options.iter().map(|o| o.option_id).collect();
  let orders: Vec<u32> = created.options.iter().map(|o| o.display_order).collect();
  assert_eq!(orders, vec![0, 1, 2]);
  assert!(created.survey.is_active);

  assert!(matches!(
    s.cast_votes(survey_id, bob.user_id, vec![options[0], options[1]])
      .await
      .unwrap(),
    VoteOutcome::Rejected(VoteRejection::SingleChoice)
  ));
  let voted = cast(s.cast_votes(survey_id, bob.user_id, vec![options[1]]).await.unwrap());
  assert_eq!(voted.voted_option_ids, vec![options[1]]);
  assert_eq!(voted.survey.total_votes, 1);
  assert_eq!(voted.options[1].vote_count, 1);

  assert!(matches!(
    s.cast_votes(survey_id, bob.user_id, vec![options[2]]).await.unwrap(),
    VoteOutcome::Rejected(VoteRejection::AlreadyVoted)
  ));
  let stranger = Uuid::new_v4();
  assert!(matches!(
    s.cast_votes(survey_id, alice.user_id, vec![stranger]).await.unwrap(),
    VoteOutcome::Rejected(VoteRejection::UnknownOption(id)) if id == stranger
  ));
  assert!(matches!(
    s.cast_votes(Uuid::new_v4(), alice.user_id, vec![options[0]])
      .await
      .unwrap(),
    VoteOutcome::SurveyMissing
  ));

  // Each viewer sees only their own votes.
  let as_alice = s.survey_view(survey_id, alice.user_id).await.unwrap().unwrap();
  assert!(as_alice.voted_option_ids.is_empty());
  assert_eq!(as_alice.survey.total_votes, 1);
}

#[tokio::test]
async fn multiple_choice_surveys_skip_repeated_options() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let created = survey(&s, &alice, true).await;
  let survey_id = created.survey.survey_id;
  let options: Vec<Uuid> = created.options.iter().map(|o| o.option_id).collect();

  cast(s.cast_votes(survey_id, bob.user_id, vec![options[0]]).await.unwrap());
  let view = cast(
    s.cast_votes(survey_id, bob.user_id, vec![options[0], options[2]])
      .await
      .unwrap(),
  );
  assert_eq!(view.voted_option_ids, vec![options[0], options[2]]);
  assert_eq!(view.survey.total_votes, 2);
  let counts: Vec<u32> = view.options.iter().map(|o| o.vote_count).collect();
  assert_eq!(counts, vec![1, 0, 1]);
}

#[tokio::test]
async fn concurrent_single_choice_votes_count_once() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let created = survey(&s, &alice, false).await;
  let survey_id = created.survey.survey_id;
  let bob_id = bob.user_id;

  let handles: Vec<_> = created
    .options
    .iter()
    .map(|o| {
      let s = s.clone();
      let option_id = o.option_id;
      tokio::spawn(async move { s.cast_votes(survey_id, bob_id, vec![option_id]).await })
    })
    .collect();
  let mut cast_count = 0;
  for h in handles {
    if let VoteOutcome::Cast(_) = h.await.unwrap().unwrap() {
      cast_count += 1;
    }
  }
  assert_eq!(cast_count, 1);
  let view = s.survey_view(survey_id, bob_id).await.unwrap().unwrap();
  assert_eq!(view.survey.total_votes, 1);
  assert_eq!(view.voted_option_ids.len(), 1);
}

#[tokio::test]
async fn closed_surveys_refuse_votes_and_deletes_cascade() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let created = survey(&s, &alice, true).await;
  let survey_id = created.survey.survey_id;
  let first = created.options[0].option_id;

  cast(s.cast_votes(survey_id, bob.user_id, vec![first]).await.unwrap());
  assert!(s.close_survey(survey_id).await.unwrap());
  assert!(matches!(
    s.cast_votes(survey_id, alice.user_id, vec![first]).await.unwrap(),
    VoteOutcome::Rejected(VoteRejection::Closed)
  ));
  assert!(!s.survey_view(survey_id, bob.user_id).await.unwrap().unwrap().survey.is_active);

  assert!(s.delete_survey(survey_id).await.unwrap());
  assert!(!s.delete_survey(survey_id).await.unwrap());
  assert!(!s.close_survey(survey_id).await.unwrap());
  assert!(s.survey_view(survey_id, bob.user_id).await.unwrap().is_none());
  let leftovers: i64 = s
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT (SELECT COUNT(*) FROM survey_options) + (SELECT COUNT(*) FROM survey_votes)",
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(leftovers, 0);
}

// ─── Groups and unread ───────────────────────────────────────────────────────

#[tokio::test]
async fn membership_is_unique() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let group_id = idea(&s, &alice, &[]).await.group.group_id;

  assert!(
    s.add_member(group_id, bob.user_id, GroupRole::Member)
      .await
      .unwrap()
      .is_some()
  );
  assert!(
    s.add_member(group_id, bob.user_id, GroupRole::Member)
      .await
      .unwrap()
      .is_none()
  );
  assert_eq!(s.members(group_id).await.unwrap().len(), 2);
  assert_eq!(s.memberships_of(bob.user_id).await.unwrap().len(), 1);

  assert!(s.remove_member(group_id, bob.user_id).await.unwrap());
  assert!(!s.remove_member(group_id, bob.user_id).await.unwrap());
}

#[tokio::test]
async fn unread_excludes_own_messages_and_receipts() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let group_id = idea(&s, &alice, &[]).await.group.group_id;
  s.add_member(group_id, bob.user_id, GroupRole::Member)
    .await
    .unwrap();

  let m1 = s
    .insert_message(group_id, alice.user_id, "hello".into())
    .await
    .unwrap();
  s.insert_message(group_id, alice.user_id, "anyone?".into())
    .await
    .unwrap();
  s.insert_message(group_id, bob.user_id, "hi".into())
    .await
    .unwrap();

  assert_eq!(s.count_unread(group_id, bob.user_id).await.unwrap(), 2);
  assert_eq!(s.count_unread(group_id, alice.user_id).await.unwrap(), 1);

  // The sender's own receipt already exists.
  assert!(!s.insert_read_receipt(m1.message_id, alice.user_id).await.unwrap());
  assert!(s.insert_read_receipt(m1.message_id, bob.user_id).await.unwrap());
  assert!(!s.insert_read_receipt(m1.message_id, bob.user_id).await.unwrap());
  assert_eq!(s.count_unread(group_id, bob.user_id).await.unwrap(), 1);

  assert_eq!(s.mark_group_read(group_id, bob.user_id).await.unwrap(), 1);
  assert_eq!(s.mark_group_read(group_id, bob.user_id).await.unwrap(), 0);
  assert_eq!(s.count_unread(group_id, bob.user_id).await.unwrap(), 0);

  let group = s.get_group(group_id).await.unwrap().unwrap();
  assert!(group.updated_at >= m1.created_at);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_land_in_the_inbox() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  s.notify(Notification {
    target_user:         alice.user_id,
    kind:                NotificationKind::Like,
    title:               "New like".into(),
    message:             "bob liked your idea".into(),
    link:                None,
    source_user:         Some(bob.user_id),
    related_entity_type: Some("IDEA".into()),
    related_entity_id:   Some(Uuid::new_v4()),
  })
  .await
  .unwrap();

  let inbox = s.notifications_for(alice.user_id).await.unwrap();
  assert_eq!(inbox.len(), 1);
  assert_eq!(inbox[0].notification.kind, NotificationKind::Like);
  assert_eq!(inbox[0].notification.source_user, Some(bob.user_id));
  assert!(!inbox[0].is_read);
  assert!(s.notifications_for(bob.user_id).await.unwrap().is_empty());

  let id = inbox[0].notification_id;
  assert!(!s.mark_notification_read(bob.user_id, id).await.unwrap());
  assert!(s.mark_notification_read(alice.user_id, id).await.unwrap());
  assert!(s.notifications_for(alice.user_id).await.unwrap()[0].is_read);
}

// ─── Counter invariants ──────────────────────────────────────────────────────

const EMOJI: [&str; 2] = ["👍", "🎉"];

#[derive(Debug, Clone)]
enum Op {
  Like { user: usize, idea: usize },
  Unlike { user: usize, idea: usize },
  Comment { user: usize, idea: usize },
  Uncomment { nth: usize },
  React { user: usize, nth: usize, emoji: usize },
  Unreact { user: usize, nth: usize, emoji: usize },
  Vote { user: usize, survey: usize, option: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
  prop_oneof![
    (0..3usize, 0..2usize).prop_map(|(user, idea)| Op::Like { user, idea }),
    (0..3usize, 0..2usize).prop_map(|(user, idea)| Op::Unlike { user, idea }),
    (0..3usize, 0..2usize).prop_map(|(user, idea)| Op::Comment { user, idea }),
    (0..8usize).prop_map(|nth| Op::Uncomment { nth }),
    (0..3usize, 0..8usize, 0..2usize)
      .prop_map(|(user, nth, emoji)| Op::React { user, nth, emoji }),
    (0..3usize, 0..8usize, 0..2usize)
      .prop_map(|(user, nth, emoji)| Op::Unreact { user, nth, emoji }),
    (0..3usize, 0..2usize, 0..3usize)
      .prop_map(|(user, survey, option)| Op::Vote { user, survey, option }),
  ]
}

/// `(counter, stored value, child rows)` for every denormalised counter.
async fn recount(s: &SqliteStore) -> Vec<(String, i64, i64)> {
  s.conn
    .call(|conn| {
      let mut stmt = conn.prepare(
        "SELECT 'like_count', i.like_count,
                (SELECT COUNT(*) FROM likes l WHERE l.idea_id = i.idea_id)
         FROM ideas i
         UNION ALL
         SELECT 'comment_count', i.comment_count,
                (SELECT COUNT(*) FROM comments c WHERE c.idea_id = i.idea_id)
         FROM ideas i
         UNION ALL
         SELECT 'reaction_count', c.reaction_count,
                (SELECT COUNT(*) FROM comment_reactions r WHERE r.comment_id = c.comment_id)
         FROM comments c
         UNION ALL
         SELECT 'vote_count', o.vote_count,
                (SELECT COUNT(*) FROM survey_votes v WHERE v.option_id = o.option_id)
         FROM survey_options o
         UNION ALL
         SELECT 'total_votes', v.total_votes,
                (SELECT COUNT(*) FROM survey_votes sv WHERE sv.survey_id = v.survey_id)
         FROM surveys v",
      )?;
      let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await
    .unwrap()
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn counters_always_match_child_rows(ops in prop::collection::vec(op_strategy(), 1..40)) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
      let s = store().await;
      let mut users = Vec::new();
      for name in ["ann", "ben", "cat"] {
        users.push(user(&s, name).await);
      }
      let ideas = [
        idea(&s, &users[0], &[]).await.idea.idea_id,
        idea(&s, &users[1], &[]).await.idea.idea_id,
      ];
      let surveys = [
        survey(&s, &users[0], false).await,
        survey(&s, &users[1], true).await,
      ];
      let mut comments = Vec::new();

      for op in ops {
        match op {
          Op::Like { user, idea } => {
            s.insert_like(users[user].user_id, ideas[idea], window(100), grant(10))
              .await
              .unwrap();
          }
          Op::Unlike { user, idea } => {
            s.delete_like(users[user].user_id, ideas[idea]).await.unwrap();
          }
          Op::Comment { user, idea } => {
            let c = s
              .insert_comment(ideas[idea], users[user].user_id, "x".into(), grant(5))
              .await
              .unwrap()
              .unwrap();
            comments.push(c.value.comment_id);
          }
          Op::Uncomment { nth } => {
            if !comments.is_empty() {
              let id = comments.remove(nth % comments.len());
              s.delete_comment(id).await.unwrap();
            }
          }
          Op::React { user, nth, emoji } => {
            if !comments.is_empty() {
              let id = comments[nth % comments.len()];
              s.insert_reaction(id, users[user].user_id, EMOJI[emoji].into())
                .await
                .unwrap();
            }
          }
          Op::Unreact { user, nth, emoji } => {
            if !comments.is_empty() {
              let id = comments[nth % comments.len()];
              s.delete_reaction(id, users[user].user_id, EMOJI[emoji].into())
                .await
                .unwrap();
            }
          }
          Op::Vote { user, survey, option } => {
            let target = &surveys[survey];
            s.cast_votes(
              target.survey.survey_id,
              users[user].user_id,
              vec![target.options[option].option_id],
            )
            .await
            .unwrap();
          }
        }
      }

      for (counter, stored, rows) in recount(&s).await {
        prop_assert_eq!(stored, rows, "{} drifted from its child rows", counter);
      }
      Ok(())
    })?;
  }
}
