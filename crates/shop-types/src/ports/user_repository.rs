use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::user::User;

/// Implementations must reject a second account with the same email with
/// [`RepoError::Conflict`], on both `create_user` and `update_user`.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    async fn update_user(&self, user: User) -> Result<Option<User>, RepoError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError>;
}
