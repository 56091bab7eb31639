use async_trait::async_trait;

use crate::domain::entities::bug::{Bug, BugRecord};
use crate::domain::repositories::error::Result;

#[async_trait]
pub trait BugRepository: Send + Sync {
    /// Insert or update by external bug id
    async fn upsert(&self, record: &BugRecord) -> Result<Bug>;

    async fn get(&self, bug_pk: i64) -> Result<Option<Bug>>;

    async fn find_by_bug_id(&self, bug_id: i64) -> Result<Option<Bug>>;
}
