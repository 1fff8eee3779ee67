//! Family Group Model
//!
//! A family groups accounts so guardians can follow the progress and threat
//! reports of the children they look after.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::user::UserRole;
use super::validation::{check_length, ValidationErrors};

pub const INVITE_CODE_LENGTH: usize = 8;

/// Uppercase letters and digits without the easily confused 0/O and 1/I
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub invite_code: String,
    pub max_members: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Family member as shown on the family page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub xp: i64,
    pub level: i64,
    pub games_played: i64,
    pub threats_reported: i64,
}

/// Family with its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyDetails {
    #[serde(flatten)]
    pub family: Family,
    pub members: Vec<FamilyMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

impl CreateFamilyRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_length(&mut errors, "name", &self.name, 1, 100);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinFamilyRequest {
    pub invite_code: String,
}

impl JoinFamilyRequest {
    /// Invite code in canonical form (trimmed, uppercase)
    pub fn normalized_code(&self) -> String {
        self.invite_code.trim().to_ascii_uppercase()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if is_valid_invite_code(&self.normalized_code()) {
            Ok(())
        } else {
            Err(ValidationErrors::single(
                "invite_code",
                format!("must be {} letters or digits", INVITE_CODE_LENGTH),
            ))
        }
    }
}

/// Generate a fresh invite code
pub fn generate_invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
            INVITE_CODE_ALPHABET[index] as char
        })
        .collect()
}

pub fn is_valid_invite_code(code: &str) -> bool {
    code.len() == INVITE_CODE_LENGTH && code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b))
}
