//! Family Service
//!
//! Family groups, invite codes and membership rules.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::database::{now_timestamp, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::log_family_change;
use crate::models::family::{
    generate_invite_code, CreateFamilyRequest, Family, FamilyDetails, FamilyMember,
    JoinFamilyRequest,
};
use crate::models::pagination::{Page, PageParams};
use crate::models::threat::Threat;
use crate::models::user::{UserError, UserRole};
use crate::services::auth_service::AuthenticatedUser;
use crate::services::threat_service::ThreatService;

/// Attempts at drawing an unused invite code before giving up
const INVITE_CODE_ATTEMPTS: usize = 5;

// Database row structure for families
#[derive(Debug, sqlx::FromRow)]
struct FamilyRow {
    id: String,
    name: String,
    owner_id: String,
    invite_code: String,
    max_members: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<FamilyRow> for Family {
    fn from(row: FamilyRow) -> Self {
        Family {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            invite_code: row.invite_code,
            max_members: row.max_members,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Database row structure for member listings
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: String,
    username: String,
    display_name: Option<String>,
    role: String,
    xp: i64,
    level: i64,
    games_played: i64,
    threats_reported: i64,
}

/// Family service responsible for groups and membership
#[derive(Debug, Clone)]
pub struct FamilyService {
    database_manager: Arc<DatabaseManager>,
    threats: ThreatService,
    max_members: i64,
}

impl FamilyService {
    pub fn new(database_manager: Arc<DatabaseManager>, threats: ThreatService, max_members: u32) -> Self {
        Self {
            database_manager,
            threats,
            max_members: i64::from(max_members),
        }
    }

    async fn family_of(&self, user_id: &str) -> AppResult<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT family_id FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.database_manager.pool)
                .await?;
        match row {
            Some((family_id,)) => Ok(family_id),
            None => Err(AppError::not_found("User")),
        }
    }

    async fn require_family(&self, user_id: &str) -> AppResult<Family> {
        let family_id = self
            .family_of(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Family"))?;
        self.load(&family_id).await
    }

    async fn load(&self, family_id: &str) -> AppResult<Family> {
        sqlx::query_as::<_, FamilyRow>(
            "SELECT id, name, owner_id, invite_code, max_members, created_at, updated_at \
             FROM families WHERE id = ?",
        )
        .bind(family_id)
        .fetch_optional(&self.database_manager.pool)
        .await?
        .map(Family::from)
        .ok_or_else(|| AppError::not_found("Family"))
    }

    async fn members(&self, family_id: &str) -> AppResult<Vec<FamilyMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, username, display_name, role, xp, level, games_played, threats_reported
            FROM users
            WHERE family_id = ?
            ORDER BY created_at, username
            "#,
        )
        .bind(family_id)
        .fetch_all(&self.database_manager.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let role = row
                    .role
                    .parse::<UserRole>()
                    .map_err(|_| UserError::InvalidRole(row.role.clone()))?;
                Ok(FamilyMember {
                    user_id: row.id,
                    username: row.username,
                    display_name: row.display_name,
                    role,
                    xp: row.xp,
                    level: row.level,
                    games_played: row.games_played,
                    threats_reported: row.threats_reported,
                })
            })
            .collect()
    }

    async fn details(&self, family: Family) -> AppResult<FamilyDetails> {
        let members = self.members(&family.id).await?;
        Ok(FamilyDetails { family, members })
    }

    /// Draw an invite code that no family uses yet
    async fn unused_invite_code(&self) -> AppResult<String> {
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = generate_invite_code(&mut rand::thread_rng());
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM families WHERE invite_code = ?")
                    .bind(&code)
                    .fetch_optional(&self.database_manager.pool)
                    .await?;
            if taken.is_none() {
                return Ok(code);
            }
            warn!("Invite code collision, drawing again");
        }
        Err(AppError::internal_error("could not allocate an invite code"))
    }

    /// Create a family owned by the caller
    pub async fn create(&self, owner_id: &str, request: CreateFamilyRequest) -> AppResult<FamilyDetails> {
        request.validate()?;
        if self.family_of(owner_id).await?.is_some() {
            return Err(AppError::conflict("already a member of a family"));
        }

        let now = now_timestamp();
        let family = Family {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            owner_id: owner_id.to_string(),
            invite_code: self.unused_invite_code().await?,
            max_members: self.max_members,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.database_manager.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO families (id, name, owner_id, invite_code, max_members, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&family.id)
        .bind(&family.name)
        .bind(&family.owner_id)
        .bind(&family.invite_code)
        .bind(family.max_members)
        .bind(family.created_at)
        .bind(family.updated_at)
        .execute(&mut *tx)
        .await?;

        let joined = sqlx::query("UPDATE users SET family_id = ?, updated_at = ? WHERE id = ? AND family_id IS NULL")
            .bind(&family.id)
            .bind(now)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        if joined.rows_affected() == 0 {
            return Err(AppError::conflict("already a member of a family"));
        }
        tx.commit().await?;

        log_family_change(&family.id, owner_id, "created");
        self.details(family).await
    }

    /// The caller's family with its members
    pub async fn get_for_user(&self, user_id: &str) -> AppResult<FamilyDetails> {
        let family = self.require_family(user_id).await?;
        self.details(family).await
    }

    /// Join the family holding `invite_code`
    pub async fn join(&self, user_id: &str, request: JoinFamilyRequest) -> AppResult<FamilyDetails> {
        request.validate()?;
        if self.family_of(user_id).await?.is_some() {
            return Err(AppError::conflict("already a member of a family"));
        }

        let family = sqlx::query_as::<_, FamilyRow>(
            "SELECT id, name, owner_id, invite_code, max_members, created_at, updated_at \
             FROM families WHERE invite_code = ?",
        )
        .bind(request.normalized_code())
        .fetch_optional(&self.database_manager.pool)
        .await?
        .map(Family::from)
        .ok_or_else(|| AppError::not_found("Family"))?;

        // the capacity check and the update happen in one statement
        let joined = sqlx::query(
            r#"
            UPDATE users SET family_id = ?, updated_at = ?
            WHERE id = ? AND family_id IS NULL
              AND (SELECT COUNT(*) FROM users WHERE family_id = ?) < ?
            "#,
        )
        .bind(&family.id)
        .bind(now_timestamp())
        .bind(user_id)
        .bind(&family.id)
        .bind(family.max_members)
        .execute(&self.database_manager.pool)
        .await?;

        if joined.rows_affected() == 0 {
            return Err(AppError::conflict("family is full"));
        }

        log_family_change(&family.id, user_id, "joined");
        self.details(family).await
    }

    /// Leave the caller's family; an owner may only leave once alone, which
    /// dissolves the family
    pub async fn leave(&self, user_id: &str) -> AppResult<()> {
        let family = self.require_family(user_id).await?;
        let mut tx = self.database_manager.pool.begin().await?;

        if family.owner_id == user_id {
            let (others,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE family_id = ? AND id != ?")
                    .bind(&family.id)
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if others > 0 {
                return Err(AppError::conflict(
                    "the owner cannot leave while other members remain",
                ));
            }
        }

        sqlx::query("UPDATE users SET family_id = NULL, updated_at = ? WHERE id = ?")
            .bind(now_timestamp())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if family.owner_id == user_id {
            sqlx::query("DELETE FROM families WHERE id = ?")
                .bind(&family.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        let change = if family.owner_id == user_id { "dissolved" } else { "left" };
        log_family_change(&family.id, user_id, change);
        Ok(())
    }

    /// Remove another member; only the owner or a parent in the family may
    pub async fn remove_member(&self, actor: &AuthenticatedUser, member_id: &str) -> AppResult<FamilyDetails> {
        let family = self.require_family(&actor.user_id).await?;
        let is_owner = family.owner_id == actor.user_id;
        if !is_owner && actor.role != UserRole::Parent {
            return Err(AppError::forbidden("only the owner or a parent can remove members"));
        }
        if member_id == actor.user_id {
            return Err(AppError::bad_request("use leave to remove yourself"));
        }
        if member_id == family.owner_id {
            return Err(AppError::forbidden("the family owner cannot be removed"));
        }

        let removed = sqlx::query("UPDATE users SET family_id = NULL, updated_at = ? WHERE id = ? AND family_id = ?")
            .bind(now_timestamp())
            .bind(member_id)
            .bind(&family.id)
            .execute(&self.database_manager.pool)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(AppError::not_found("Family member"));
        }

        log_family_change(&family.id, member_id, "removed");
        self.details(family).await
    }

    /// Replace the invite code; owner only
    pub async fn regenerate_invite_code(&self, actor: &AuthenticatedUser) -> AppResult<Family> {
        let mut family = self.require_family(&actor.user_id).await?;
        if family.owner_id != actor.user_id {
            return Err(AppError::forbidden("only the owner can change the invite code"));
        }

        family.invite_code = self.unused_invite_code().await?;
        family.updated_at = now_timestamp();
        sqlx::query("UPDATE families SET invite_code = ?, updated_at = ? WHERE id = ?")
            .bind(&family.invite_code)
            .bind(family.updated_at)
            .bind(&family.id)
            .execute(&self.database_manager.pool)
            .await?;

        log_family_change(&family.id, &actor.user_id, "invite_code_regenerated");
        Ok(family)
    }

    /// Threat reports from every member; guardians and the owner only
    pub async fn threat_feed(&self, actor: &AuthenticatedUser, params: PageParams) -> AppResult<Page<Threat>> {
        let family = self.require_family(&actor.user_id).await?;
        if family.owner_id != actor.user_id && !actor.role.is_guardian() {
            return Err(AppError::forbidden("only guardians can view the family feed"));
        }
        self.threats.list_for_family(&family.id, params).await
    }
}
