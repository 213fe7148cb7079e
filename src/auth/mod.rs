//! Registration, login and bearer tokens.

pub mod password;
pub mod token;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::AuthConfig;
use crate::db::UserStore;
use crate::models::{
    Caller, DocumentOwner, LoginRequest, LoginResponse, NewUser, RegisterRequest, Role, User,
    UserProfile,
};
use crate::types::{AppError, AppResult};

pub const DEMO_EMAIL: &str = "demo@flowbit.com";
pub const DEMO_PASSWORD: &str = "password123";
const DEMO_NAME: &str = "Demo User";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserProfile> {
        let request = RegisterRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        };
        request.validate().map_err(validation_error)?;

        let user = self
            .create_user(request.name, request.email, &request.password, Role::User)
            .await?;
        info!(user_id = %user.id, "User registered");
        Ok(UserProfile::from(&user))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let stored = user.password_hash.clone();
        let password = request.password;
        let matches =
            tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
                .await
                .map_err(|e| AppError::Internal(format!("password check failed: {e}")))?;
        if !matches {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            message: "Login successful".to_string(),
            user: UserProfile::from(&user),
            token,
        })
    }

    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        token::issue_token(user, &self.config.secret, self.config.max_jwt_expiration)
    }

    /// Resolves a bearer token to the stored user it was issued for.
    ///
    /// The role comes from the user row, not the token, so promotions apply
    /// to tokens issued earlier.
    pub async fn authenticate(&self, token: &str) -> AppResult<Caller> {
        let claims = token::verify_token(token, &self.config.secret)?;
        let Some(user) = self.users.find_user_by_id(claims.sub).await? else {
            warn!(user_id = %claims.sub, "Token presented for unknown user");
            return Err(AppError::Unauthorized("User not found".to_string()));
        };

        Ok(Caller {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    /// Owner details for a set of user ids, keyed by id.
    pub async fn owners(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, DocumentOwner>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = self.users.find_users_by_ids(&unique).await?;
        Ok(users
            .iter()
            .map(|user| (user.id, DocumentOwner::from(user)))
            .collect())
    }

    /// Grants the admin role.
    pub async fn promote(&self, email: &str) -> AppResult<UserProfile> {
        let user = self
            .users
            .set_user_role(&normalize_email(email), Role::Admin)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with email {email}")))?;
        info!(user_id = %user.id, "User promoted to admin");
        Ok(UserProfile::from(&user))
    }

    /// Creates the demo account unless it already exists.
    pub async fn seed_demo_user(&self) -> AppResult<Option<UserProfile>> {
        if self.users.find_user_by_email(DEMO_EMAIL).await?.is_some() {
            return Ok(None);
        }
        let user = self
            .create_user(
                DEMO_NAME.to_string(),
                DEMO_EMAIL.to_string(),
                DEMO_PASSWORD,
                Role::User,
            )
            .await?;
        info!(user_id = %user.id, "Seeded demo user");
        Ok(Some(UserProfile::from(&user)))
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
    ) -> AppResult<User> {
        let iterations = self.config.password_hash_iterations;
        let password = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&password, iterations))
                .await
                .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

        self.users
            .insert_user(NewUser {
                id: Uuid::new_v4(),
                email,
                name,
                password_hash,
                role,
            })
            .await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .map(|e| match &e.message {
            Some(message) => message.to_string(),
            None => e.code.to_string(),
        })
        .collect();
    AppError::Validation(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::test_config;
    use crate::db::MemoryStore;

    fn service() -> AuthService {
        let config = test_config(PathBuf::from("uploads"));
        AuthService::new(Arc::new(MemoryStore::new()), config.auth)
    }

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();

        let profile = auth.register(registration("  Alice@Example.com ")).await.unwrap();
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.role, Role::User);

        let response = auth
            .login(LoginRequest {
                email: "ALICE@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, profile.id);

        let caller = auth.authenticate(&response.token).await.unwrap();
        assert_eq!(caller.id, profile.id);
        assert_eq!(caller.role, Role::User);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = service();

        let short = RegisterRequest {
            password: "short".to_string(),
            ..registration("a@example.com")
        };
        let err = auth.register(short).await.unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(msg) if msg.contains("at least 8 characters")),
            "{err}"
        );

        let bad_email = registration("not-an-email");
        assert!(matches!(
            auth.register(bad_email).await,
            Err(AppError::Validation(_))
        ));

        let err = auth.register(RegisterRequest::default()).await.unwrap_err();
        assert!(matches!(&err, AppError::Validation(msg) if msg.contains("Name is required")));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service();
        auth.register(registration("a@example.com")).await.unwrap();

        let err = auth.register(registration("A@EXAMPLE.COM")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let auth = service();
        auth.register(registration("a@example.com")).await.unwrap();

        let wrong_password = auth
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "nope-nope-nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: "b@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);

        let missing = auth.login(LoginRequest::default()).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_authenticate_requires_stored_user() {
        let auth = service();
        let ghost = User {
            id: Uuid::new_v4(),
            email: "ghost@example.com".to_string(),
            name: "Ghost".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let token = auth.issue_token(&ghost).unwrap();

        let err = auth.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_promotion_applies_to_existing_tokens() {
        let auth = service();
        auth.register(registration("a@example.com")).await.unwrap();
        let response = auth
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();
        assert!(!auth.authenticate(&response.token).await.unwrap().is_admin());

        auth.promote("a@example.com").await.unwrap();
        assert!(auth.authenticate(&response.token).await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn test_owners_by_id() {
        let auth = service();
        let alice = auth.register(registration("a@example.com")).await.unwrap();

        let owners = auth
            .owners(&[alice.id, alice.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[&alice.id].email, "a@example.com");
        assert_eq!(owners[&alice.id].name, "Alice");
    }

    #[tokio::test]
    async fn test_seed_and_promote() {
        let auth = service();

        let seeded = auth.seed_demo_user().await.unwrap();
        assert_eq!(seeded.unwrap().email, DEMO_EMAIL);
        assert!(auth.seed_demo_user().await.unwrap().is_none());

        let promoted = auth.promote(DEMO_EMAIL).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let response = auth
            .login(LoginRequest {
                email: DEMO_EMAIL.to_string(),
                password: DEMO_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        assert!(auth.authenticate(&response.token).await.unwrap().is_admin());

        let missing = auth.promote("nobody@example.com").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
