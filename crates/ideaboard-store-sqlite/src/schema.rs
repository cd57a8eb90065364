//! SQL schema for the Ideaboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL plus the badge catalogue seed; idempotent thanks to
/// `IF NOT EXISTS` and `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,            -- 'EMPLOYEE' | 'PROJECT_MANAGER' | 'ADMIN'
    xp_points   INTEGER NOT NULL DEFAULT 0 CHECK (xp_points >= 0),
    level       INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS badges (
    badge_id     TEXT PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    description  TEXT NOT NULL,
    criteria     TEXT NOT NULL,
    xp_reward    INTEGER NOT NULL DEFAULT 0
);

-- Grants are permanent; the primary key is the race backstop.
CREATE TABLE IF NOT EXISTS user_badges (
    user_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    badge_id  TEXT NOT NULL REFERENCES badges(badge_id),
    earned_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

-- like_count and comment_count are only ever changed in the same
-- transaction that inserts or deletes the matching child row. view_count
-- is a plain atomic increment.
CREATE TABLE IF NOT EXISTS ideas (
    idea_id             TEXT PRIMARY KEY,
    author_id           TEXT NOT NULL REFERENCES users(user_id),
    title               TEXT NOT NULL,
    description         TEXT NOT NULL,
    category            TEXT NOT NULL,
    tags                TEXT NOT NULL DEFAULT '[]',
    status              TEXT NOT NULL DEFAULT 'CONCEPT',
    progress_percentage INTEGER NOT NULL DEFAULT 0
                        CHECK (progress_percentage BETWEEN 0 AND 100),
    like_count          INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    comment_count       INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    view_count          INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist_items (
    item_id          TEXT PRIMARY KEY,
    idea_id          TEXT NOT NULL REFERENCES ideas(idea_id) ON DELETE CASCADE,
    title            TEXT NOT NULL,
    is_completed     INTEGER NOT NULL DEFAULT 0,
    ordinal_position INTEGER NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS likes (
    like_id    TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    idea_id    TEXT NOT NULL REFERENCES ideas(idea_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, idea_id)
);

-- Append-only record of every like ever created; the weekly quota counts
-- these, so removing a like never returns a slot. No foreign keys: deleting
-- an idea must not refund quota either.
CREATE TABLE IF NOT EXISTS like_ledger (
    entry_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    idea_id    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id     TEXT PRIMARY KEY,
    idea_id        TEXT NOT NULL REFERENCES ideas(idea_id) ON DELETE CASCADE,
    author_id      TEXT NOT NULL REFERENCES users(user_id),
    content        TEXT NOT NULL,
    reaction_count INTEGER NOT NULL DEFAULT 0 CHECK (reaction_count >= 0),
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comment_reactions (
    comment_id TEXT NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    emoji      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (comment_id, user_id, emoji)
);

-- vote_count and total_votes move only with survey_votes rows, in the same
-- transaction.
CREATE TABLE IF NOT EXISTS surveys (
    survey_id            TEXT PRIMARY KEY,
    creator_id           TEXT NOT NULL REFERENCES users(user_id),
    question             TEXT NOT NULL,
    description          TEXT,
    is_active            INTEGER NOT NULL DEFAULT 1,
    is_anonymous         INTEGER NOT NULL DEFAULT 0,
    allow_multiple_votes INTEGER NOT NULL DEFAULT 0,
    total_votes          INTEGER NOT NULL DEFAULT 0 CHECK (total_votes >= 0),
    created_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS survey_options (
    option_id     TEXT PRIMARY KEY,
    survey_id     TEXT NOT NULL REFERENCES surveys(survey_id) ON DELETE CASCADE,
    option_text   TEXT NOT NULL,
    vote_count    INTEGER NOT NULL DEFAULT 0 CHECK (vote_count >= 0),
    display_order INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS survey_votes (
    survey_id  TEXT NOT NULL REFERENCES surveys(survey_id) ON DELETE CASCADE,
    option_id  TEXT NOT NULL REFERENCES survey_options(option_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (survey_id, user_id, option_id)
);

CREATE TABLE IF NOT EXISTS idea_groups (
    group_id    TEXT PRIMARY KEY,
    idea_id     TEXT NOT NULL UNIQUE REFERENCES ideas(idea_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    created_by  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id  TEXT NOT NULL REFERENCES idea_groups(group_id) ON DELETE CASCADE,
    user_id   TEXT NOT NULL REFERENCES users(user_id),
    role      TEXT NOT NULL,             -- 'CREATOR' | 'MEMBER'
    joined_at TEXT NOT NULL,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS group_messages (
    message_id TEXT PRIMARY KEY,
    group_id   TEXT NOT NULL REFERENCES idea_groups(group_id) ON DELETE CASCADE,
    sender_id  TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Absence of a row means unread.
CREATE TABLE IF NOT EXISTS group_message_reads (
    message_id TEXT NOT NULL REFERENCES group_messages(message_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    read_at    TEXT NOT NULL,
    PRIMARY KEY (message_id, user_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id     TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    kind                TEXT NOT NULL,
    title               TEXT NOT NULL,
    message             TEXT NOT NULL,
    link                TEXT,
    source_user_id      TEXT,
    related_entity_type TEXT,
    related_entity_id   TEXT,
    is_read             INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ideas_author_idx         ON ideas(author_id);
CREATE INDEX IF NOT EXISTS checklist_idea_idx       ON checklist_items(idea_id, ordinal_position);
CREATE INDEX IF NOT EXISTS likes_idea_idx           ON likes(idea_id);
CREATE INDEX IF NOT EXISTS like_ledger_user_idx     ON like_ledger(user_id, created_at);
CREATE INDEX IF NOT EXISTS comments_author_idx      ON comments(author_id);
CREATE INDEX IF NOT EXISTS comments_idea_idx        ON comments(idea_id);
CREATE INDEX IF NOT EXISTS survey_options_idx       ON survey_options(survey_id, display_order);
CREATE INDEX IF NOT EXISTS group_members_user_idx   ON group_members(user_id);
CREATE INDEX IF NOT EXISTS group_messages_group_idx ON group_messages(group_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_user_idx   ON notifications(user_id, created_at);

INSERT OR IGNORE INTO badges (badge_id, name, display_name, description, criteria, xp_reward) VALUES
    ('6f1c2a8e-3b7d-4e0a-9c51-0d2f8e4b7a01', 'first_idea',  'First Idea',  'Submitted your first idea',        'ideas_authored >= 1',     25),
    ('6f1c2a8e-3b7d-4e0a-9c51-0d2f8e4b7a02', 'popular',     'Popular',     'Received 10 likes on your ideas',  'likes_received >= 10',    50),
    ('6f1c2a8e-3b7d-4e0a-9c51-0d2f8e4b7a03', 'commentator', 'Commentator', 'Wrote 50 comments',                'comments_authored >= 50', 50);

PRAGMA user_version = 1;
";
