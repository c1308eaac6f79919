use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{TokenError, TokenService};
use crate::errors::AppError;
use shop_types::domain::user::{normalize_email, Address, User};
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use std::sync::Arc;
use uuid::Uuid;

pub const MSG_USER_EXISTS: &str = "User already exists";
pub const MSG_BAD_CREDENTIALS: &str = "Invalid email or password";
pub const MSG_TOKEN_EXPIRED: &str = "Token expired, please log in again";
pub const MSG_TOKEN_INVALID: &str = "Invalid token, authorization denied";
pub const MSG_TOKEN_USER_GONE: &str = "User not found, authorization denied";

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    tokens: TokenService,
}

fn user_conflict(e: RepoError) -> AppError {
    match e {
        RepoError::Conflict(_) => AppError::Conflict(MSG_USER_EXISTS.into()),
        other => other.into(),
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>, tokens: TokenService) -> Self {
        Self { repo, tokens }
    }

    fn issue(&self, user: &User) -> Result<String, AppError> {
        self.tokens
            .issue(user.id)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
    }

    /// Creates a customer account and returns it with a fresh token.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<(User, String), AppError> {
        let email = normalize_email(&email);
        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(MSG_USER_EXISTS.into()));
        }

        let hash = hash_password(password).await?;
        let user = User::new(name, &email, hash).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let user = self.repo.create_user(user).await.map_err(user_conflict)?;
        tracing::info!(user_id = %user.id, "user registered");

        let token = self.issue(&user)?;
        Ok((user, token))
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: String, password: String) -> Result<(User, String), AppError> {
        let email = normalize_email(&email);
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            tracing::warn!("login failed");
            return Err(AppError::Unauthorized(MSG_BAD_CREDENTIALS.into()));
        };
        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "login failed");
            return Err(AppError::Unauthorized(MSG_BAD_CREDENTIALS.into()));
        }

        let token = self.issue(&user)?;
        Ok((user, token))
    }

    /// Resolves a bearer token to a stored user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.tokens.user_id(token).map_err(|e| match e {
            TokenError::Expired => AppError::Unauthorized(MSG_TOKEN_EXPIRED.into()),
            _ => AppError::Unauthorized(MSG_TOKEN_INVALID.into()),
        })?;
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(MSG_TOKEN_USER_GONE.into()))
    }

    pub async fn profile(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User, AppError> {
        let mut user = self.profile(id).await?;
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::BadRequest("name empty".into()));
            }
            user.name = name;
        }
        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if !email.contains('@') {
                return Err(AppError::BadRequest("invalid email".into()));
            }
            user.email = email;
        }
        if let Some(password) = update.password {
            user.password_hash = hash_password(password).await?;
        }
        user.touch();

        let updated = self
            .repo
            .update_user(user)
            .await
            .map_err(user_conflict)?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        tracing::info!(user_id = %updated.id, "profile updated");
        Ok(updated)
    }

    pub async fn add_address(&self, id: Uuid, address: Address) -> Result<User, AppError> {
        let mut user = self.profile(id).await?;
        user.add_address(address);
        self.repo
            .update_user(user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_user(id).await? {
            tracing::info!(user_id = %id, "user deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".into()))
        }
    }

    /// Makes sure an admin account exists for `email`, creating or promoting it.
    /// A promoted account gets `password` as its new credential.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: String) -> Result<User, AppError> {
        let email = normalize_email(email);
        if let Some(mut existing) = self.repo.find_user_by_email(&email).await? {
            if existing.is_admin {
                return Ok(existing);
            }
            existing.is_admin = true;
            existing.password_hash = hash_password(password).await?;
            existing.touch();
            tracing::info!(user_id = %existing.id, "promoted account to admin");
            return self
                .repo
                .update_user(existing)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".into()));
        }

        let hash = hash_password(password).await?;
        let mut admin = User::new(name.to_string(), &email, hash)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        admin.is_admin = true;
        let admin = self.repo.create_user(admin).await.map_err(user_conflict)?;
        tracing::info!(user_id = %admin.id, "admin account created");
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shop_repo::memory::InMemoryRepo;

    fn service() -> UserService<InMemoryRepo> {
        UserService::new(Arc::new(InMemoryRepo::new()), TokenService::new("test-secret"))
    }

    #[tokio::test]
    async fn register_then_login_issues_tokens_for_same_user() {
        let svc = service();
        let (user, token) = svc
            .register("Alice".into(), "Alice@Example.com".into(), "password1".into())
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "password1");
        assert_eq!(svc.authenticate(&token).await.unwrap().id, user.id);

        let (again, token) = svc
            .login("alice@example.com".into(), "password1".into())
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(svc.authenticate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_keeps_first_user() {
        let svc = service();
        let (first, _) = svc
            .register("Alice".into(), "a@example.com".into(), "password1".into())
            .await
            .unwrap();
        let dup = svc
            .register("Mallory".into(), "A@example.com".into(), "password2".into())
            .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let stored = svc.profile(first.id).await.unwrap();
        assert_eq!(stored.name, "Alice");
        assert!(svc
            .login("a@example.com".into(), "password1".into())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let svc = service();
        svc.register("Bob".into(), "bob@example.com".into(), "password1".into())
            .await
            .unwrap();

        let wrong_pw = svc
            .login("bob@example.com".into(), "nope".into())
            .await
            .unwrap_err();
        let no_user = svc
            .login("ghost@example.com".into(), "nope".into())
            .await
            .unwrap_err();
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
        assert!(matches!(wrong_pw, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn authenticate_distinguishes_expired_from_invalid() {
        let repo = Arc::new(InMemoryRepo::new());
        let svc = UserService::new(repo.clone(), TokenService::new("test-secret"));
        let (user, _) = svc
            .register("Eve".into(), "eve@example.com".into(), "password1".into())
            .await
            .unwrap();

        let stale = TokenService::with_ttl("test-secret", Duration::days(-2));
        let expired = stale.issue(user.id).unwrap();
        match svc.authenticate(&expired).await {
            Err(AppError::Unauthorized(m)) => assert_eq!(m, MSG_TOKEN_EXPIRED),
            other => panic!("unexpected {other:?}"),
        }
        match svc.authenticate("garbage").await {
            Err(AppError::Unauthorized(m)) => assert_eq!(m, MSG_TOKEN_INVALID),
            other => panic!("unexpected {other:?}"),
        }

        let orphan = TokenService::new("test-secret").issue(Uuid::new_v4()).unwrap();
        match svc.authenticate(&orphan).await {
            Err(AppError::Unauthorized(m)) => assert_eq!(m, MSG_TOKEN_USER_GONE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_profile_rehashes_password() {
        let svc = service();
        let (user, _) = svc
            .register("Carol".into(), "carol@example.com".into(), "password1".into())
            .await
            .unwrap();
        let updated = svc
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("Caroline".into()),
                    password: Some("password2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Caroline");
        assert_eq!(updated.email, "carol@example.com");
        assert!(svc
            .login("carol@example.com".into(), "password1".into())
            .await
            .is_err());
        assert!(svc
            .login("carol@example.com".into(), "password2".into())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_email() {
        let svc = service();
        svc.register("A".into(), "a@example.com".into(), "password1".into())
            .await
            .unwrap();
        let (b, _) = svc
            .register("B".into(), "b@example.com".into(), "password1".into())
            .await
            .unwrap();
        let res = svc
            .update_profile(
                b.id,
                ProfileUpdate {
                    email: Some("a@example.com".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn ensure_admin_creates_then_promotes() {
        let svc = service();
        let admin = svc
            .ensure_admin("Admin", "root@example.com", "rootpass".into())
            .await
            .unwrap();
        assert!(admin.is_admin);
        let again = svc
            .ensure_admin("Admin", "root@example.com", "rootpass".into())
            .await
            .unwrap();
        assert_eq!(again.id, admin.id);

        let (customer, _) = svc
            .register("Dana".into(), "dana@example.com".into(), "password1".into())
            .await
            .unwrap();
        let promoted = svc
            .ensure_admin("Dana", "dana@example.com", "operator-pw".into())
            .await
            .unwrap();
        assert_eq!(promoted.id, customer.id);
        assert!(promoted.is_admin);

        // The seeded password replaces whatever the customer registered with.
        let (admin, _) = svc
            .login("dana@example.com".into(), "operator-pw".into())
            .await
            .unwrap();
        assert!(admin.is_admin);
        assert!(matches!(
            svc.login("dana@example.com".into(), "password1".into()).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn delete_user_not_found() {
        let svc = service();
        assert!(matches!(
            svc.delete_user(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
