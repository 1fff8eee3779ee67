//! Authentication Service
//!
//! Registration, login and signed bearer tokens. Passwords are stored as
//! Argon2id PHC strings.
//!
//! Tokens have the form `base64url(claims).base64url(signature)` where the
//! signature is HMAC-SHA256 over the encoded claims with the server secret.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::Config;
use crate::database::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::logging::log_authentication_event;
use crate::models::user::{LoginRequest, RegisterRequest, User, UserRole};
use crate::services::user_service::{NewUserRecord, UserService};

type HmacSha256 = Hmac<Sha256>;

/// Argon2id password hashing in PHC string format
pub mod password {
    use argon2::{
        password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
        Argon2,
    };
    use rand::RngCore;

    const SALT_BYTES: usize = 16;

    /// Hash `password` under a fresh random salt
    pub fn hash(password: &str) -> Result<String, password_hash::Error> {
        let mut salt = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;

        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Check `password` against a stored PHC string; unparseable hashes never match
    pub fn verify(password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Claims carried inside a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Token plus the account it was issued for
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub user: User,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    secret: Arc<Vec<u8>>,
    token_ttl_seconds: i64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(users: UserService, config: &Config) -> Self {
        Self {
            users,
            secret: Arc::new(config.token_secret.as_bytes().to_vec()),
            token_ttl_seconds: config.token_ttl_seconds(),
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let password_hash = password::hash(&request.password)?;
        let user = self
            .users
            .create(NewUserRecord {
                username: request.username.trim().to_string(),
                email: request.email.trim().to_lowercase(),
                password_hash,
                role: request.role,
                display_name: request.display_name,
                age: request.age,
            })
            .await?;

        log_authentication_event("register", Some(&user.id), true);
        self.session_for(user)
    }

    /// Sign in by username or email
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        if request.identifier.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::authentication_failed("invalid credentials"));
        }

        let user = self.users.find_by_identifier(&request.identifier).await?;
        match user {
            Some(user) if password::verify(&request.password, &user.password_hash) => {
                log_authentication_event("login", Some(&user.id), true);
                self.session_for(user)
            }
            other => {
                log_authentication_event("login", other.as_ref().map(|u| u.id.as_str()), false);
                Err(AppError::authentication_failed("invalid credentials"))
            }
        }
    }

    fn session_for(&self, user: User) -> AppResult<AuthResponse> {
        let now = now_timestamp();
        let claims = TokenClaims {
            sub: user.id.clone(),
            role: user.role,
            iat: now,
            exp: now + self.token_ttl_seconds,
        };
        let token = self.issue_token(&claims)?;
        Ok(AuthResponse {
            token,
            token_type: "Bearer",
            expires_at: claims.exp,
            user,
        })
    }

    fn mac(&self) -> HmacSha256 {
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC key length is unrestricted"),
        }
    }

    pub fn issue_token(&self, claims: &TokenClaims) -> AppResult<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    /// Check signature and expiry
    pub fn verify_token(&self, token: &str) -> AppResult<TokenClaims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AppError::authentication_failed("malformed token"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::authentication_failed("malformed token"))?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AppError::authentication_failed("invalid token signature"))?;

        let claims: TokenClaims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| AppError::authentication_failed("malformed token"))?;

        if claims.exp <= now_timestamp() {
            return Err(AppError::authentication_failed("token expired"));
        }
        Ok(claims)
    }

    /// Resolve a bearer token to the caller
    pub fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let claims = self.verify_token(token)?;
        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;

    async fn service() -> AuthService {
        let db = Arc::new(DatabaseManager::in_memory().await.unwrap());
        AuthService::new(UserService::new(db), &Config::default())
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct1horse".to_string(),
            role: UserRole::Individual,
            display_name: None,
            age: None,
        }
    }

    #[test]
    fn test_password_hashing() {
        let hash = password::hash("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        // fresh salt per call
        assert_ne!(hash, password::hash("hunter22").unwrap());
        assert!(password::verify("hunter22", &hash));
        assert!(!password::verify("hunter23", &hash));
        assert!(!password::verify("hunter22", "not-a-phc-string"));
        assert!(!password::verify("hunter22", ""));
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = service().await;
        let registered = service.register(register_request("player_one")).await.unwrap();
        assert_eq!(registered.token_type, "Bearer");
        assert_eq!(registered.user.username, "player_one");

        let by_name = service
            .login(LoginRequest {
                identifier: "player_one".to_string(),
                password: "correct1horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(by_name.user.id, registered.user.id);

        let by_email = service
            .login(LoginRequest {
                identifier: "Player_One@Example.com".to_string(),
                password: "correct1horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(by_email.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let service = service().await;
        service.register(register_request("player_one")).await.unwrap();

        for (identifier, password) in [("player_one", "wrong1pass"), ("nobody", "correct1horse")] {
            let err = service
                .login(LoginRequest {
                    identifier: identifier.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Authentication error: invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_token_round_trip_and_tampering() {
        let service = service().await;
        let session = service.register(register_request("player_one")).await.unwrap();

        let caller = service.authenticate(&session.token).unwrap();
        assert_eq!(caller.user_id, session.user.id);
        assert_eq!(caller.role, UserRole::Individual);

        let (payload, signature) = session.token.split_once('.').unwrap();
        let forged_claims = TokenClaims {
            sub: session.user.id.clone(),
            role: UserRole::Admin,
            iat: 0,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        assert!(service
            .verify_token(&format!("{}.{}", forged_payload, signature))
            .is_err());
        assert!(service.verify_token(payload).is_err());
        assert!(service.verify_token("garbage").is_err());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let service = service().await;
        let token = service
            .issue_token(&TokenClaims {
                sub: "u1".to_string(),
                role: UserRole::Child,
                iat: 0,
                exp: now_timestamp() - 1,
            })
            .unwrap();
        let err = service.verify_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(ref m) if m == "token expired"));
    }

    #[tokio::test]
    async fn test_other_secret_rejected() {
        let service = service().await;
        let session = service.register(register_request("player_one")).await.unwrap();

        let mut config = Config::default();
        config.token_secret = "another-secret-that-is-at-least-32-chars".to_string();
        let other = AuthService::new(service.users.clone(), &config);
        assert!(other.verify_token(&session.token).is_err());
    }
}
