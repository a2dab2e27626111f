//! `SQLite` storage for accounts, relationships, messages, groups and alerts.
//!
//! Timestamps are stored as Unix milliseconds. Coordinates are validated on
//! the way in, so every row read back holds a well-formed location.

// SQLite operations need to hold the lock for the duration of the operation.
// Dropping the guard earlier would require restructuring all methods.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::error::{Result, SocialError};
use super::types::{
    Alert, Gender, Group, Message, NewAlert, NewUser, ProfileUpdate, UserProfile,
};
use crate::discovery::{
    self, BlockRelation, GroupId, MessageEdge, SocialRepository, UserId, UserSnapshot,
};
use crate::location::Coordinate;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.first_name, u.last_name, \
     u.date_of_birth, u.gender, u.description, u.profile_picture, \
     u.latitude, u.longitude, u.last_activity";

const ALERT_COLUMNS: &str = "a.id, a.title, a.content, a.start_at, a.end_at, a.group_id, a.style";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `SQLite`-based storage for social data.
///
/// Thread-safe wrapper around a `SQLite` connection. Share it between
/// services with an `Arc`.
pub struct SocialStorage {
    conn: Mutex<Connection>,
}

impl SocialStorage {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SocialError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                date_of_birth TEXT NOT NULL,
                gender TEXT NOT NULL DEFAULT 'M',
                description TEXT NOT NULL DEFAULT '',
                profile_picture TEXT NOT NULL DEFAULT '',
                latitude REAL NOT NULL DEFAULT 55,
                longitude REAL NOT NULL DEFAULT 55,
                last_activity INTEGER NOT NULL
            );

            -- person follows friend
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                person_id INTEGER NOT NULL,
                friend_id INTEGER NOT NULL,
                UNIQUE (person_id, friend_id)
            );

            CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                blocker_id INTEGER NOT NULL,
                blocked_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (blocker_id, blocked_id)
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL,
                receiver_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages (sender_id);
            CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages (receiver_id);

            CREATE TABLE IF NOT EXISTS user_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                logo_url TEXT NOT NULL DEFAULT '',
                site_url TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                start_at INTEGER NOT NULL,
                end_at INTEGER NOT NULL,
                group_id INTEGER NOT NULL,
                style TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_group ON alerts (group_id, end_at);
            ",
        )?;

        Ok(())
    }

    // ==================== User Operations ====================

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the username or e-mail is taken, or an
    /// error if the database operation fails.
    pub fn insert_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<UserProfile> {
        let coordinate = user.coordinate.unwrap_or_default();
        coordinate.validate()?;
        let conn = self.lock()?;

        conn.execute(
            r"
            INSERT INTO users (username, email, first_name, last_name, date_of_birth, gender,
                               latitude, longitude, last_activity)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                &user.username,
                &user.email,
                &user.first_name,
                &user.last_name,
                user.date_of_birth.format(DATE_FORMAT).to_string(),
                user.gender.as_str(),
                coordinate.latitude,
                coordinate.longitude,
                now.timestamp_millis(),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                SocialError::AlreadyExists(format!(
                    "User with username {} or email {}",
                    user.username, user.email
                ))
            } else {
                e.into()
            }
        })?;

        Ok(UserProfile {
            id: conn.last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            description: String::new(),
            profile_picture: String::new(),
            coordinate,
            last_activity: from_millis(now.timestamp_millis())?,
        })
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row is
    /// malformed.
    pub fn get_user(&self, id: UserId) -> Result<Option<UserProfile>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
                params![id],
                UserRow::read,
            )
            .optional()?;

        row.map(UserRow::into_profile).transpose()
    }

    /// Retrieves every user, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id"))?;
        let rows = stmt
            .query_map([], UserRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(UserRow::into_profile).collect()
    }

    /// Retrieves every user except `excluding`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users_except(&self, excluding: UserId) -> Result<Vec<UserProfile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id != ?1 ORDER BY u.id"
        ))?;
        let rows = stmt
            .query_map(params![excluding], UserRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(UserRow::into_profile).collect()
    }

    /// Sets a user's location.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the coordinate is out of range, or
    /// `NotFound` if the user doesn't exist.
    pub fn update_location(&self, id: UserId, coordinate: Coordinate) -> Result<()> {
        coordinate.validate()?;
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE users SET latitude = ?1, longitude = ?2 WHERE id = ?3",
            params![coordinate.latitude, coordinate.longitude, id],
        )?;
        ensure_touched(rows, || format!("User {id}"))
    }

    /// Applies a partial profile update and returns the stored result.
    ///
    /// The read and the write happen under one lock, so concurrent updates
    /// to different fields don't overwrite each other.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist, `InvalidData` for an
    /// out-of-range coordinate, or `AlreadyExists` if the new username or
    /// e-mail is taken.
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<UserProfile> {
        if let Some(coordinate) = update.coordinate {
            coordinate.validate()?;
        }
        let conn = self.lock()?;

        let mut profile = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
                params![id],
                UserRow::read,
            )
            .optional()?
            .ok_or_else(|| SocialError::NotFound(format!("User {id}")))?
            .into_profile()?;
        update.apply_to(&mut profile);

        conn.execute(
            r"
            UPDATE users
            SET username = ?1, email = ?2, first_name = ?3, last_name = ?4,
                date_of_birth = ?5, gender = ?6, description = ?7, profile_picture = ?8,
                latitude = ?9, longitude = ?10
            WHERE id = ?11
            ",
            params![
                &profile.username,
                &profile.email,
                &profile.first_name,
                &profile.last_name,
                profile.date_of_birth.format(DATE_FORMAT).to_string(),
                profile.gender.as_str(),
                &profile.description,
                &profile.profile_picture,
                profile.coordinate.latitude,
                profile.coordinate.longitude,
                id,
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                SocialError::AlreadyExists(format!(
                    "User with username {} or email {}",
                    profile.username, profile.email
                ))
            } else {
                e.into()
            }
        })?;

        Ok(profile)
    }

    /// Records activity for a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn touch_activity(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE users SET last_activity = ?1 WHERE id = ?2",
            params![at.timestamp_millis(), id],
        )?;
        ensure_touched(rows, || format!("User {id}"))
    }

    /// Deletes a user and everything that references them.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user doesn't exist.
    pub fn delete_user(&self, id: UserId) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM follows WHERE person_id = ?1 OR friend_id = ?1",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM blocks WHERE blocker_id = ?1 OR blocked_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM group_members WHERE user_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        ensure_touched(rows, || format!("User {id}"))?;
        tx.commit()?;
        Ok(())
    }

    // ==================== Follow Operations ====================

    /// Records that `person` follows `friend`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the follow exists.
    pub fn insert_follow(&self, person: UserId, friend: UserId) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO follows (person_id, friend_id) VALUES (?1, ?2)",
            params![person, friend],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                SocialError::AlreadyExists(format!("User {person} already follows {friend}"))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    /// Removes a follow. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_follow(&self, person: UserId, friend: UserId) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM follows WHERE person_id = ?1 AND friend_id = ?2",
            params![person, friend],
        )?;
        Ok(rows > 0)
    }

    /// Users `person` follows, in follow order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_following(&self, person: UserId) -> Result<Vec<UserProfile>> {
        self.query_users(
            &format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN follows f ON f.friend_id = u.id
                 WHERE f.person_id = ?1
                 ORDER BY f.id"
            ),
            person,
        )
    }

    /// `(following, followers)` counts for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn follow_counts(&self, id: UserId) -> Result<(u64, u64)> {
        let conn = self.lock()?;
        let following: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE person_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let followers: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE friend_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok((following.unsigned_abs(), followers.unsigned_abs()))
    }

    // ==================== Block Operations ====================

    /// Records that `blocker` blocked `blocked`. Returns `false` if the block
    /// already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_block(&self, blocker: UserId, blocked: UserId, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO blocks (blocker_id, blocked_id, created_at) VALUES (?1, ?2, ?3)",
            params![blocker, blocked, at.timestamp_millis()],
        )?;
        Ok(rows > 0)
    }

    /// Removes a block. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM blocks WHERE blocker_id = ?1 AND blocked_id = ?2",
            params![blocker, blocked],
        )?;
        Ok(rows > 0)
    }

    /// Every block where `user` is blocker or blocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn block_relations_for(&self, user: UserId) -> Result<Vec<BlockRelation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT blocker_id, blocked_id
            FROM blocks
            WHERE blocker_id = ?1 OR blocked_id = ?1
            ORDER BY id
            ",
        )?;
        let relations = stmt
            .query_map(params![user], |row| {
                Ok(BlockRelation::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(relations)
    }

    /// Users `blocker` has blocked, in block order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserProfile>> {
        self.query_users(
            &format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN blocks b ON b.blocked_id = u.id
                 WHERE b.blocker_id = ?1
                 ORDER BY b.id"
            ),
            blocker,
        )
    }

    // ==================== Message Operations ====================

    /// Stores a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_message(
        &self,
        sender: UserId,
        receiver: UserId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![sender, receiver, text, at.timestamp_millis()],
        )?;
        Ok(Message {
            id: conn.last_insert_rowid(),
            sender,
            receiver,
            text: text.to_string(),
            created_at: from_millis(at.timestamp_millis())?,
        })
    }

    /// Messages between `a` and `b` in both directions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn conversation(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, sender_id, receiver_id, text, created_at
            FROM messages
            WHERE (sender_id = ?1 AND receiver_id = ?2)
               OR (sender_id = ?2 AND receiver_id = ?1)
            ORDER BY created_at, id
            ",
        )?;
        let rows = stmt
            .query_map(params![a, b], |row| {
                let id: i64 = row.get(0)?;
                let sender: UserId = row.get(1)?;
                let receiver: UserId = row.get(2)?;
                let text: String = row.get(3)?;
                let created_at: i64 = row.get(4)?;
                Ok((id, sender, receiver, text, created_at))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, sender, receiver, text, created_at)| {
                Ok(Message {
                    id,
                    sender,
                    receiver,
                    text,
                    created_at: from_millis(created_at)?,
                })
            })
            .collect()
    }

    /// Every message sent or received by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn message_edges_for(&self, user: UserId) -> Result<Vec<MessageEdge>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT sender_id, receiver_id, created_at
            FROM messages
            WHERE sender_id = ?1 OR receiver_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )?;
        let rows = stmt
            .query_map(params![user], |row| {
                let sender: UserId = row.get(0)?;
                let receiver: UserId = row.get(1)?;
                let created_at: i64 = row.get(2)?;
                Ok((sender, receiver, created_at))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(sender, receiver, created_at)| {
                Ok(MessageEdge {
                    sender,
                    receiver,
                    sent_at: from_millis(created_at)?,
                })
            })
            .collect()
    }

    // ==================== Group Operations ====================

    /// Stores a group with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_group(
        &self,
        name: &str,
        logo_url: &str,
        site_url: &str,
        password_hash: &str,
    ) -> Result<Group> {
        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO user_groups (name, logo_url, site_url, password_hash)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![name, logo_url, site_url, password_hash],
        )?;
        Ok(Group {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            logo_url: logo_url.to_string(),
            site_url: site_url.to_string(),
        })
    }

    /// Retrieves a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        let conn = self.lock()?;
        let group = conn
            .query_row(
                "SELECT id, name, logo_url, site_url FROM user_groups WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Group {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        logo_url: row.get(2)?,
                        site_url: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }

    /// The stored password hash of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_password_hash(&self, id: GroupId) -> Result<Option<String>> {
        let conn = self.lock()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM user_groups WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Adds a member. Returns `false` if they already were one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_group_member(&self, group: GroupId, user: UserId, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![group, user, at.timestamp_millis()],
        )?;
        Ok(rows > 0)
    }

    /// Removes a member. Returns whether they were one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_group_member(&self, group: GroupId, user: UserId) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
            params![group, user],
        )?;
        Ok(rows > 0)
    }

    /// Number of members in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_member_count(&self, group: GroupId) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
            params![group],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }

    /// Members of a group, in join order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_group_members(&self, group: GroupId) -> Result<Vec<UserProfile>> {
        self.query_users(
            &format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN group_members gm ON gm.user_id = u.id
                 WHERE gm.group_id = ?1
                 ORDER BY gm.joined_at, u.id"
            ),
            group,
        )
    }

    /// Groups a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn groups_for_user(&self, user: UserId) -> Result<Vec<Group>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r"
            SELECT g.id, g.name, g.logo_url, g.site_url
            FROM user_groups g
            JOIN group_members gm ON gm.group_id = g.id
            WHERE gm.user_id = ?1
            ORDER BY g.id
            ",
        )?;
        let groups = stmt
            .query_map(params![user], |row| {
                Ok(Group {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    logo_url: row.get(2)?,
                    site_url: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    // ==================== Alert Operations ====================

    /// Stores an alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_alert(&self, alert: &NewAlert) -> Result<Alert> {
        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO alerts (title, content, start_at, end_at, group_id, style)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                &alert.title,
                &alert.content,
                alert.start_date.timestamp_millis(),
                alert.end_date.timestamp_millis(),
                alert.group,
                &alert.style,
            ],
        )?;
        Ok(Alert {
            id: conn.last_insert_rowid(),
            title: alert.title.clone(),
            content: alert.content.clone(),
            start_date: from_millis(alert.start_date.timestamp_millis())?,
            end_date: from_millis(alert.end_date.timestamp_millis())?,
            group: alert.group,
            style: alert.style.clone(),
        })
    }

    /// Number of alerts visible to `user` at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_active_alerts(&self, user: UserId, now: DateTime<Utc>) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            r"
            SELECT COUNT(*)
            FROM alerts a
            JOIN group_members gm ON gm.group_id = a.group_id
            WHERE gm.user_id = ?1 AND a.start_at <= ?2 AND a.end_at >= ?2
            ",
            params![user, now.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }

    /// A window of the alerts visible to `user` at `now`, soonest-ending
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn active_alerts(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Alert>> {
        let conn = self.lock()?;
        let offset = i64::try_from(offset)
            .map_err(|_| SocialError::InvalidData(format!("Offset too large: {offset}")))?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS}
             FROM alerts a
             JOIN group_members gm ON gm.group_id = a.group_id
             WHERE gm.user_id = ?1 AND a.start_at <= ?2 AND a.end_at >= ?2
             ORDER BY a.end_at, a.id
             LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
            .query_map(
                params![user, now.timestamp_millis(), limit, offset],
                |row| {
                    let id: i64 = row.get(0)?;
                    let title: String = row.get(1)?;
                    let content: String = row.get(2)?;
                    let start_at: i64 = row.get(3)?;
                    let end_at: i64 = row.get(4)?;
                    let group: GroupId = row.get(5)?;
                    let style: String = row.get(6)?;
                    Ok((id, title, content, start_at, end_at, group, style))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, title, content, start_at, end_at, group, style)| {
                Ok(Alert {
                    id,
                    title,
                    content,
                    start_date: from_millis(start_at)?,
                    end_date: from_millis(end_at)?,
                    group,
                    style,
                })
            })
            .collect()
    }

    fn query_users(&self, sql: &str, id: i64) -> Result<Vec<UserProfile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![id], UserRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(UserRow::into_profile).collect()
    }
}

impl SocialRepository for SocialStorage {
    fn get_user(&self, id: UserId) -> discovery::Result<Option<UserSnapshot>> {
        Ok(Self::get_user(self, id)?.map(|p| p.snapshot()))
    }

    fn list_users(&self, excluding: UserId) -> discovery::Result<Vec<UserSnapshot>> {
        Ok(self
            .list_users_except(excluding)?
            .iter()
            .map(UserProfile::snapshot)
            .collect())
    }

    fn list_block_relations(&self, user: UserId) -> discovery::Result<Vec<BlockRelation>> {
        Ok(self.block_relations_for(user)?)
    }

    fn list_messages(&self, involving: UserId) -> discovery::Result<Vec<MessageEdge>> {
        Ok(self.message_edges_for(involving)?)
    }

    fn list_group_members(&self, group: GroupId) -> discovery::Result<Option<Vec<UserSnapshot>>> {
        if self.get_group(group)?.is_none() {
            return Ok(None);
        }
        let members = Self::list_group_members(self, group)?;
        Ok(Some(members.iter().map(UserProfile::snapshot).collect()))
    }
}

/// Raw `users` row, converted outside the rusqlite closure so conversion
/// errors surface as `SocialError`.
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: String,
    description: String,
    profile_picture: String,
    latitude: f64,
    longitude: f64,
    last_activity: i64,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            date_of_birth: row.get(5)?,
            gender: row.get(6)?,
            description: row.get(7)?,
            profile_picture: row.get(8)?,
            latitude: row.get(9)?,
            longitude: row.get(10)?,
            last_activity: row.get(11)?,
        })
    }

    fn into_profile(self) -> Result<UserProfile> {
        let gender = Gender::parse(&self.gender)
            .ok_or_else(|| SocialError::InvalidData(format!("Invalid gender: {}", self.gender)))?;
        let date_of_birth = NaiveDate::parse_from_str(&self.date_of_birth, DATE_FORMAT)
            .map_err(|e| {
                SocialError::InvalidData(format!(
                    "Invalid date of birth {}: {e}",
                    self.date_of_birth
                ))
            })?;

        Ok(UserProfile {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            gender,
            description: self.description,
            profile_picture: self.profile_picture,
            coordinate: Coordinate::new(self.latitude, self.longitude)?,
            last_activity: from_millis(self.last_activity)?,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| SocialError::InvalidData(format!("Invalid timestamp: {ms}")))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn ensure_touched(rows: usize, what: impl FnOnce() -> String) -> Result<()> {
    if rows == 0 {
        return Err(SocialError::NotFound(what()));
    }
    Ok(())
}
