//! Services module for CyberQuest
//!
//! Contains all business logic and service implementations.

pub mod auth_service;
pub mod family_service;
pub mod game_service;
pub mod threat_service;
pub mod user_service;

// Re-export commonly used services
pub use auth_service::{AuthService, AuthenticatedUser};
pub use family_service::FamilyService;
pub use game_service::GameService;
pub use threat_service::ThreatService;
pub use user_service::UserService;
