use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::application::admin::export::export_json;
use crate::application::admin::{ModelAdminOptions, matches_search};
use crate::application::errors::Result;
use crate::domain::repositories::vote_repository::VoteRepository;

pub const VOTE_ADMIN: ModelAdminOptions = ModelAdminOptions {
    model: "Vote",
    list_display: &["user", "poll", "date_voted"],
    search_fields: &["user__first_name", "user__last_name", "poll__name"],
    list_filter: &[],
    date_hierarchy: None,
    readonly_fields: &[],
    inlines: &[],
    actions: &[],
    exportable: true,
};

#[derive(Debug, Clone, Serialize)]
pub struct VoteRow {
    pub id: i64,
    pub user: String,
    pub poll: String,
    pub date_voted: DateTime<Utc>,
}

pub struct VoteAdmin {
    votes: Arc<dyn VoteRepository>,
}

impl VoteAdmin {
    pub fn new(votes: Arc<dyn VoteRepository>) -> Self {
        Self { votes }
    }

    pub async fn changelist(&self, search: Option<&str>) -> Result<Vec<VoteRow>> {
        let rows = self
            .votes
            .list_detailed()
            .await?
            .into_iter()
            .filter(|d| {
                search.is_none_or(|q| {
                    matches_search(&[&d.user_first_name, &d.user_last_name, &d.poll_name], q)
                })
            })
            .map(|d| VoteRow {
                id: d.vote.id,
                user: format!("{} {}", d.user_first_name, d.user_last_name)
                    .trim()
                    .to_string(),
                poll: d.poll_name,
                date_voted: d.vote.date_voted,
            })
            .collect();
        Ok(rows)
    }

    pub async fn export(&self, search: Option<&str>) -> Result<String> {
        export_json(VOTE_ADMIN.model, &self.changelist(search).await?)
    }
}
