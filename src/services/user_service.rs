//! User Service
//!
//! Account persistence, profile updates, experience and the leaderboard.

use std::sync::Arc;

use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{now_timestamp, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::models::user::{
    level_for_xp, LeaderboardEntry, UpdateProfileRequest, User, UserError, UserRole,
};
use crate::services::auth_service::password;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, display_name, age, \
                            family_id, xp, level, games_played, threats_reported, created_at, updated_at";

// Database row structure for users
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    display_name: Option<String>,
    age: Option<i64>,
    family_id: Option<String>,
    xp: i64,
    level: i64,
    games_played: i64,
    threats_reported: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|_| UserError::InvalidRole(row.role.clone()))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            display_name: row.display_name,
            age: row.age,
            family_id: row.family_id,
            xp: row.xp,
            level: row.level,
            games_played: row.games_played,
            threats_reported: row.threats_reported,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub display_name: Option<String>,
    pub age: Option<i64>,
}

/// Counters bumped together with an experience award
#[derive(Debug, Clone, Copy, Default)]
pub struct XpAward {
    pub xp: i64,
    pub games_played: i64,
    pub threats_reported: i64,
}

/// User service responsible for account records
#[derive(Debug, Clone)]
pub struct UserService {
    database_manager: Arc<DatabaseManager>,
}

impl UserService {
    pub fn new(database_manager: Arc<DatabaseManager>) -> Self {
        Self { database_manager }
    }

    /// Insert a new account, rejecting duplicate usernames and emails
    pub async fn create(&self, record: NewUserRecord) -> AppResult<User> {
        let pool = &self.database_manager.pool;

        let taken: Option<(String, String)> = sqlx::query_as(
            "SELECT username, email FROM users WHERE username = ? OR email = ? LIMIT 1",
        )
        .bind(&record.username)
        .bind(&record.email)
        .fetch_optional(pool)
        .await?;

        if let Some((username, _)) = taken {
            return Err(if username.eq_ignore_ascii_case(&record.username) {
                AppError::conflict("username is already taken")
            } else {
                AppError::conflict("email is already registered")
            });
        }

        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, display_name, age,
                               xp, level, games_played, threats_reported, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, 1, 0, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role.as_ref())
        .bind(&record.display_name)
        .bind(record.age)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        info!(user_id = %id, username = %record.username, role = %record.role, "User created");
        self.get(&id).await
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.database_manager.pool)
        .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    /// Look up by username or email (case-insensitive)
    pub async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ? OR email = ? LIMIT 1",
            USER_COLUMNS
        ))
        .bind(identifier.trim())
        .bind(identifier.trim())
        .fetch_optional(&self.database_manager.pool)
        .await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    pub async fn get(&self, id: &str) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Apply a profile update
    pub async fn update_profile(&self, id: &str, update: UpdateProfileRequest) -> AppResult<User> {
        update.validate()?;
        let user = self.get(id).await?;

        if update.is_empty() {
            return Ok(user);
        }

        let mut password_hash = user.password_hash.clone();
        if let Some(ref new_password) = update.new_password {
            let current = update.current_password.as_deref().unwrap_or_default();
            if !password::verify(current, &user.password_hash) {
                return Err(AppError::validation_error(
                    "current_password",
                    "is incorrect",
                ));
            }
            password_hash = password::hash(new_password)?;
        }

        if let Some(ref email) = update.email {
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(&self.database_manager.pool)
                    .await?;
            if taken.is_some() {
                return Err(AppError::conflict("email is already registered"));
            }
        }

        sqlx::query(
            r#"
            UPDATE users
            SET display_name = ?, email = ?, age = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.display_name.or(user.display_name))
        .bind(update.email.unwrap_or(user.email))
        .bind(update.age.or(user.age))
        .bind(password_hash)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.database_manager.pool)
        .await?;

        debug!(user_id = %id, "Profile updated");
        self.get(id).await
    }

    /// Delete an account along with its sessions and reports
    ///
    /// An owner who still shares the family with others must leave or hand
    /// it over first; a family with no other members is removed.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.database_manager.pool.begin().await?;

        let owned: Option<(String,)> = sqlx::query_as("SELECT id FROM families WHERE owner_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some((family_id,)) = owned {
            let (others,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE family_id = ? AND id != ?")
                    .bind(&family_id)
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if others > 0 {
                return Err(AppError::conflict(
                    "remove the other family members before deleting the family owner",
                ));
            }
            sqlx::query("UPDATE users SET family_id = NULL WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM families WHERE id = ?")
                .bind(&family_id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }

        tx.commit().await?;
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Top players by experience
    pub async fn leaderboard(&self, limit: u32) -> AppResult<Vec<LeaderboardEntry>> {
        let rows: Vec<(String, String, Option<String>, i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, username, display_name, xp, level
            FROM users
            WHERE role != 'admin'
            ORDER BY xp DESC, created_at ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.database_manager.pool)
        .await?;

        Ok(rows
            .into_iter()
            .zip(1u32..)
            .map(|((user_id, username, display_name, xp, level), rank)| LeaderboardEntry {
                rank,
                user_id,
                username,
                display_name,
                xp,
                level,
            })
            .collect())
    }
}

/// Add experience and counters to a user inside an open transaction
pub(crate) async fn apply_xp(
    conn: &mut SqliteConnection,
    user_id: &str,
    award: XpAward,
) -> AppResult<i64> {
    let (xp,): (i64,) = sqlx::query_as("SELECT xp FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let new_xp = (xp + award.xp).max(0);
    sqlx::query(
        r#"
        UPDATE users
        SET xp = ?, level = ?, games_played = games_played + ?,
            threats_reported = threats_reported + ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_xp)
    .bind(level_for_xp(new_xp))
    .bind(award.games_played)
    .bind(award.threats_reported)
    .bind(now_timestamp())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(new_xp)
}
