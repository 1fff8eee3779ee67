//! User Account Model
//!
//! Accounts, roles, profile validation and the experience/level curve.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::validation::{check_length, ValidationErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

static USERNAME_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$"));

/// Non-empty local part, dotted domain with no empty labels
static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s.]+(?:\.[^@\s.]+)+$"));

fn matches(pattern: &LazyLock<Result<Regex, regex::Error>>, text: &str) -> bool {
    pattern.as_ref().is_ok_and(|re| re.is_match(text))
}

/// Account roles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Parent,
    Child,
    Individual,
    Employee,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Individual
    }
}

impl UserRole {
    /// Whether the role may manage other family members
    pub fn is_guardian(&self) -> bool {
        matches!(self, UserRole::Parent | UserRole::Admin)
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub display_name: Option<String>,
    pub age: Option<i64>,
    pub family_id: Option<String>,
    pub xp: i64,
    pub level: i64,
    pub games_played: i64,
    pub threats_reported: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn public_profile(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            xp: self.xp,
            level: self.level,
            games_played: self.games_played,
        }
    }
}

/// Profile fields visible to other users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub xp: i64,
    pub level: i64,
    pub games_played: i64,
}

/// Leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: i64,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub display_name: Option<String>,
    pub age: Option<i64>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_username(&mut errors, &self.username);
        validate_email(&mut errors, &self.email);
        validate_password(&mut errors, "password", &self.password);

        if self.role == UserRole::Admin {
            errors.add("role", "admin accounts cannot be self-registered");
        }

        if let Some(ref name) = self.display_name {
            check_length(&mut errors, "display_name", name, 1, MAX_DISPLAY_NAME_LENGTH);
        }

        if let Some(age) = self.age {
            validate_age(&mut errors, age);
            if self.role == UserRole::Child && age >= 18 {
                errors.add("age", "child accounts must be under 18");
            }
        }

        errors.into_result()
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

/// Profile update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.display_name {
            check_length(&mut errors, "display_name", name, 1, MAX_DISPLAY_NAME_LENGTH);
        }
        if let Some(ref email) = self.email {
            validate_email(&mut errors, email);
        }
        if let Some(age) = self.age {
            validate_age(&mut errors, age);
        }
        if let Some(ref new_password) = self.new_password {
            validate_password(&mut errors, "new_password", new_password);
            if self.current_password.is_none() {
                errors.add("current_password", "is required to change the password");
            }
        }

        errors.into_result()
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.new_password.is_none()
    }
}

/// Level reached for a given amount of experience
pub fn level_for_xp(xp: i64) -> i64 {
    let xp = xp.max(0) as f64;
    (xp / 100.0).sqrt().floor() as i64 + 1
}

fn validate_username(errors: &mut ValidationErrors, username: &str) {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        errors.add("username", "must be between 3 and 32 characters");
    } else if !matches(&USERNAME_PATTERN, username) {
        errors.add("username", "may only contain letters, digits and underscores");
    }
}

fn validate_email(errors: &mut ValidationErrors, email: &str) {
    if !matches(&EMAIL_PATTERN, email) {
        errors.add("email", "is not a valid email address");
    }
}

fn validate_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    } else if !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(char::is_alphabetic)
    {
        errors.add(field, "must contain at least one letter and one digit");
    }
}

fn validate_age(errors: &mut ValidationErrors, age: i64) {
    if !(5..=120).contains(&age) {
        errors.add("age", "must be between 5 and 120");
    }
}

/// User model errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Invalid stored role: {0}")]
    InvalidRole(String),
}
