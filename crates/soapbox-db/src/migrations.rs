use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                   TEXT PRIMARY KEY,
            email                TEXT NOT NULL UNIQUE,
            name                 TEXT NOT NULL,
            password             TEXT NOT NULL,
            role                 TEXT NOT NULL DEFAULT 'member',
            subscription_status  TEXT NOT NULL DEFAULT 'inactive',
            created_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            user_email  TEXT NOT NULL,
            user_name   TEXT NOT NULL,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            category    TEXT NOT NULL DEFAULT 'general',
            priority    TEXT NOT NULL DEFAULT 'medium',
            status      TEXT NOT NULL DEFAULT 'pending',
            like_count  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user
            ON messages(user_id);
        CREATE INDEX IF NOT EXISTS idx_messages_status
            ON messages(status);
        CREATE INDEX IF NOT EXISTS idx_messages_feed
            ON messages(like_count, created_at);

        CREATE TABLE IF NOT EXISTS message_likes (
            message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, message_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_message
            ON message_likes(message_id);
        CREATE INDEX IF NOT EXISTS idx_likes_user
            ON message_likes(user_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
