//! Models module for CyberQuest
//!
//! Contains all data models and their validation logic.

pub mod family;
pub mod game_session;
pub mod pagination;
pub mod quiz;
pub mod threat;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use family::{Family, FamilyDetails, FamilyMember};
pub use game_session::{Difficulty, GameSession, GameStatus, GameType};
pub use pagination::{Page, PageParams};
pub use threat::{Indicator, IndicatorKind, Severity, Threat, ThreatCategory, ThreatStatus};
pub use user::{User, UserRole};
pub use validation::{FieldError, ValidationErrors};
