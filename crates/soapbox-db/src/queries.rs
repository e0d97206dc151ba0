use crate::Database;
use crate::models::{FeedRow, LikeOutcome, MessageRow, SubmitOutcome, UnlikeOutcome, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

const FEED_STATUSES: &str = "('pending', 'completed')";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, name: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password) VALUES (?1, ?2, ?3, ?4)",
                params![id, email, name, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// All users with their message counts, newest first. Admin console view.
    pub fn list_users_with_stats(&self) -> Result<Vec<(UserRow, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.email, u.name, u.password, u.role, u.subscription_status, u.created_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.user_id = u.id)
                 FROM users u
                 ORDER BY u.created_at DESC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        UserRow {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            name: row.get(2)?,
                            password: row.get(3)?,
                            role: row.get(4)?,
                            subscription_status: row.get(5)?,
                            created_at: row.get(6)?,
                        },
                        row.get(7)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Patches role and/or subscription status. Returns false when no such user.
    pub fn update_user(
        &self,
        id: &str,
        role: Option<&str>,
        subscription_status: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET role = COALESCE(?2, role),
                     subscription_status = COALESCE(?3, subscription_status)
                 WHERE id = ?1",
                params![id, role, subscription_status],
            )?;
            Ok(changed > 0)
        })
    }

    /// Hard-deletes a user with all their messages and likes. Counters on
    /// messages the user had liked are decremented so like_count stays equal
    /// to the ledger.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: Option<String> = tx
                .query_row("SELECT id FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            tx.execute(
                "UPDATE messages SET like_count = MAX(like_count - 1, 0)
                 WHERE id IN (SELECT message_id FROM message_likes WHERE user_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM message_likes WHERE user_id = ?1", [id])?;
            // Remaining likes on this user's own messages go via FK cascade
            tx.execute("DELETE FROM messages WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;

            tx.commit()?;
            Ok(true)
        })
    }

    // -- Messages --

    /// Count-then-insert in one transaction so concurrent submissions cannot
    /// exceed the quota. `quota` comes from the caller's plan.
    pub fn submit_message(
        &self,
        user_id: &str,
        user_email: &str,
        user_name: &str,
        title: &str,
        content: &str,
        category: &str,
        priority: &str,
        quota: i64,
    ) -> Result<SubmitOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current: i64 = tx.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            if current >= quota {
                return Ok(SubmitOutcome::QuotaExceeded { limit: quota, current });
            }

            tx.execute(
                "INSERT INTO messages (user_id, user_email, user_name, title, content, category, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![user_id, user_email, user_name, title, content, category, priority],
            )?;
            let id = tx.last_insert_rowid();

            tx.commit()?;
            Ok(SubmitOutcome::Created { id, remaining: quota - current - 1 })
        })
    }

    pub fn list_messages_for_user(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_all_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{MESSAGE_COLUMNS} ORDER BY created_at DESC"))?;
            let rows = stmt
                .query_map([], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Owner lookup for the authorization check on status changes and deletes.
    pub fn get_message_owner(&self, id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let owner = conn
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(owner)
        })
    }

    /// Returns false when the message vanished between the ownership check
    /// and the write.
    pub fn set_message_status(&self, id: i64, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![id, status],
            )?;
            Ok(changed > 0)
        })
    }

    /// Hard delete; likes cascade via the foreign key. Returns false when
    /// nothing was there to delete.
    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Likes --

    /// Ledger insert and counter increment are one transaction; a duplicate
    /// like is rejected, not duplicated.
    pub fn like_message(&self, user_id: &str, message_id: i64) -> Result<LikeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !message_exists(&tx, message_id)? {
                return Ok(LikeOutcome::NotFound);
            }

            let already: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM message_likes WHERE user_id = ?1 AND message_id = ?2",
                    params![user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;
            if already.is_some() {
                return Ok(LikeOutcome::AlreadyLiked);
            }

            tx.execute(
                "INSERT INTO message_likes (user_id, message_id) VALUES (?1, ?2)",
                params![user_id, message_id],
            )?;
            tx.execute(
                "UPDATE messages SET like_count = like_count + 1 WHERE id = ?1",
                [message_id],
            )?;
            let count: i64 = tx.query_row(
                "SELECT like_count FROM messages WHERE id = ?1",
                [message_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(LikeOutcome::Liked(count))
        })
    }

    /// Counterpart of [`Database::like_message`]; the counter is floored at 0
    /// so it never goes negative.
    pub fn unlike_message(&self, user_id: &str, message_id: i64) -> Result<UnlikeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !message_exists(&tx, message_id)? {
                return Ok(UnlikeOutcome::NotFound);
            }

            let removed = tx.execute(
                "DELETE FROM message_likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )?;
            if removed == 0 {
                return Ok(UnlikeOutcome::NotLiked);
            }

            tx.execute(
                "UPDATE messages SET like_count = MAX(like_count - 1, 0) WHERE id = ?1",
                [message_id],
            )?;
            let count: i64 = tx.query_row(
                "SELECT like_count FROM messages WHERE id = ?1",
                [message_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(UnlikeOutcome::Unliked(count))
        })
    }

    // -- Feed --

    /// One page of the public feed plus the total eligible count. Each row
    /// carries whether the caller has liked it.
    pub fn feed_page(&self, caller_id: &str, limit: u32, offset: u64) -> Result<(Vec<FeedRow>, i64)> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT m.id, m.user_id, m.user_name, m.title, m.content, m.category,
                        m.like_count, m.created_at,
                        EXISTS(SELECT 1 FROM message_likes l
                               WHERE l.message_id = m.id AND l.user_id = ?1)
                 FROM messages m
                 WHERE m.status IN {FEED_STATUSES}
                 ORDER BY m.like_count DESC, m.created_at DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;

            let rows = stmt
                .query_map(params![caller_id, limit, offset], |row| {
                    Ok(FeedRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        user_name: row.get(2)?,
                        title: row.get(3)?,
                        content: row.get(4)?,
                        category: row.get(5)?,
                        like_count: row.get(6)?,
                        created_at: row.get(7)?,
                        is_liked_by_user: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM messages WHERE status IN {FEED_STATUSES}"),
                [],
                |row| row.get(0),
            )?;

            Ok((rows, total))
        })
    }
}

const MESSAGE_COLUMNS: &str = "SELECT id, user_id, user_email, user_name, title, content, \
     category, priority, status, like_count, created_at, updated_at FROM messages";

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_email: row.get(2)?,
        user_name: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        category: row.get(6)?,
        priority: row.get(7)?,
        status: row.get(8)?,
        like_count: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn message_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM messages WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, email, name, password, role, subscription_status, created_at
         FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                password: row.get(3)?,
                role: row.get(4)?,
                subscription_status: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}
