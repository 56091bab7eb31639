use async_trait::async_trait;

use crate::domain::entities::user::{Group, NewUser, User};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_group(&self, name: &str) -> Result<Group>;

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>>;

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>>;

    /// Insert a user and attach it to the named groups, creating missing groups
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn get(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn members_of_group(&self, group_id: i64) -> Result<Vec<User>>;

    async fn is_member(&self, user_id: i64, group_id: i64) -> Result<bool> {
        Ok(self
            .members_of_group(group_id)
            .await?
            .iter()
            .any(|u| u.id == user_id))
    }

    async fn set_comment_notifications(&self, user_id: i64, enabled: bool) -> Result<()>;
}
