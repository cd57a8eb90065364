//! A persistent notification inbox.
//!
//! [`SqliteStore`] doubles as a [`Notifier`]: every dispatched notification
//! becomes a row in `notifications`, which the owning user can list later.

use chrono::{DateTime, Utc};
use ideaboard_core::notification::{Notification, Notifier};
use rusqlite::OptionalExtension as _;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{decode_dt, decode_label, decode_uuid, encode_dt, encode_uuid},
};

/// A notification as stored in a user's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct StoredNotification {
  pub notification_id: Uuid,
  #[serde(flatten)]
  pub notification:    Notification,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

struct RawNotification {
  notification_id:     String,
  user_id:             String,
  kind:                String,
  title:               String,
  message:             String,
  link:                Option<String>,
  source_user_id:      Option<String>,
  related_entity_type: Option<String>,
  related_entity_id:   Option<String>,
  is_read:             bool,
  created_at:          String,
}

impl RawNotification {
  fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id:     row.get(0)?,
      user_id:             row.get(1)?,
      kind:                row.get(2)?,
      title:               row.get(3)?,
      message:             row.get(4)?,
      link:                row.get(5)?,
      source_user_id:      row.get(6)?,
      related_entity_type: row.get(7)?,
      related_entity_id:   row.get(8)?,
      is_read:             row.get(9)?,
      created_at:          row.get(10)?,
    })
  }

  fn into_stored(self) -> Result<StoredNotification> {
    Ok(StoredNotification {
      notification_id: decode_uuid(&self.notification_id)?,
      notification:    Notification {
        target_user:         decode_uuid(&self.user_id)?,
        kind:                decode_label("kind", &self.kind)?,
        title:               self.title,
        message:             self.message,
        link:                self.link,
        source_user:         self
          .source_user_id
          .as_deref()
          .map(decode_uuid)
          .transpose()?,
        related_entity_type: self.related_entity_type,
        related_entity_id:   self
          .related_entity_id
          .as_deref()
          .map(decode_uuid)
          .transpose()?,
      },
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

impl SqliteStore {
  /// The user's inbox, newest first.
  pub async fn notifications_for(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<StoredNotification>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, user_id, kind, title, message, link,
                  source_user_id, related_entity_type, related_entity_id,
                  is_read, created_at
           FROM notifications
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawNotification::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_stored).collect()
  }

  /// Mark one inbox entry read. Returns `false` if it does not exist or
  /// belongs to someone else.
  pub async fn mark_notification_read(
    &self,
    user_id: Uuid,
    notification_id: Uuid,
  ) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let id_str   = encode_uuid(notification_id);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "UPDATE notifications SET is_read = 1
               WHERE notification_id = ?1 AND user_id = ?2
               RETURNING 1",
              rusqlite::params![id_str, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(found)
  }
}

impl Notifier for SqliteStore {
  type Error = crate::Error;

  async fn notify(&self, notification: Notification) -> Result<()> {
    let id_str      = encode_uuid(Uuid::new_v4());
    let user_str    = encode_uuid(notification.target_user);
    let kind_str    = notification.kind.to_string();
    let source_str  = notification.source_user.map(encode_uuid);
    let related_str = notification.related_entity_id.map(encode_uuid);
    let at_str      = encode_dt(Utc::now());
    let Notification { title, message, link, related_entity_type, .. } =
      notification;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, user_id, kind, title, message, link,
             source_user_id, related_entity_type, related_entity_id,
             is_read, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
          rusqlite::params![
            id_str,
            user_str,
            kind_str,
            title,
            message,
            link,
            source_str,
            related_entity_type,
            related_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
