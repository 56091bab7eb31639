use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::admin::export::export_json;
use crate::application::admin::{DateDrilldown, InlineOptions, ModelAdminOptions, matches_search};
use crate::application::errors::{Result, VotingError};
use crate::application::services::poll_service::PollService;
use crate::domain::entities::choices::{RadioPoll, RangePoll};
use crate::domain::entities::poll::{Poll, PollChanges};
use crate::domain::entities::poll_comment::PollComment;
use crate::domain::entities::vote::Vote;
use crate::domain::repositories::comment_repository::CommentRepository;
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::repositories::vote_repository::VoteRepository;

pub const POLL_ADMIN: ModelAdminOptions = ModelAdminOptions {
    model: "Poll",
    list_display: &["name", "start", "end", "valid_groups"],
    search_fields: &["name"],
    list_filter: &["automated_poll", "is_extended", "comments_allowed"],
    date_hierarchy: Some("start"),
    readonly_fields: &["task_start_id", "task_end_id"],
    inlines: &[
        InlineOptions {
            model: "RangePoll",
            readonly_fields: &[],
        },
        InlineOptions {
            model: "RadioPoll",
            readonly_fields: &[],
        },
        InlineOptions {
            model: "PollComment",
            readonly_fields: &[],
        },
        InlineOptions {
            model: "Vote",
            readonly_fields: &[],
        },
    ],
    actions: &["delete_model"],
    exportable: true,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PollFilters {
    pub automated_poll: Option<bool>,
    pub is_extended: Option<bool>,
    pub comments_allowed: Option<bool>,
}

impl PollFilters {
    fn matches(&self, poll: &Poll) -> bool {
        self.automated_poll.is_none_or(|v| poll.automated_poll == v)
            && self.is_extended.is_none_or(|v| poll.is_extended == v)
            && self.comments_allowed.is_none_or(|v| poll.comments_allowed == v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollChangeListQuery {
    pub search: Option<String>,
    pub filters: PollFilters,
    pub start: DateDrilldown,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollRow {
    pub id: i64,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub valid_groups: String,
}

/// Everything the change page shows for one poll
#[derive(Debug, Clone, Serialize)]
pub struct PollChangeForm {
    pub poll: Poll,
    pub range_polls: Vec<RangePoll>,
    pub radio_polls: Vec<RadioPoll>,
    pub comments: Vec<PollComment>,
    pub votes: Vec<Vote>,
}

pub struct PollAdmin {
    polls: Arc<dyn PollRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    votes: Arc<dyn VoteRepository>,
    poll_service: Arc<PollService>,
    time_zone: Tz,
}

impl PollAdmin {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        votes: Arc<dyn VoteRepository>,
        poll_service: Arc<PollService>,
        time_zone: Tz,
    ) -> Self {
        Self {
            polls,
            users,
            comments,
            votes,
            poll_service,
            time_zone,
        }
    }

    pub async fn changelist(&self, query: &PollChangeListQuery) -> Result<Vec<PollRow>> {
        let mut rows = Vec::new();
        for poll in self.polls.list().await? {
            if !query.filters.matches(&poll) || !query.start.matches(poll.start, self.time_zone) {
                continue;
            }
            if let Some(search) = &query.search {
                if !matches_search(&[&poll.name], search) {
                    continue;
                }
            }

            let valid_groups = self
                .users
                .get_group(poll.valid_group_id)
                .await?
                .map(|g| g.name)
                .unwrap_or_default();
            rows.push(PollRow {
                id: poll.id,
                name: poll.name,
                start: poll.start,
                end: poll.end,
                valid_groups,
            });
        }
        Ok(rows)
    }

    pub async fn change_form(&self, poll_id: i64) -> Result<PollChangeForm> {
        let poll = self.poll_service.get_poll(poll_id).await?;
        Ok(PollChangeForm {
            range_polls: self.polls.range_polls(poll.id).await?,
            radio_polls: self.polls.radio_polls(poll.id).await?,
            comments: self.comments.list_for_poll(poll.id).await?,
            votes: self.votes.list_for_poll(poll.id).await?,
            poll,
        })
    }

    /// Save the change form. Task ids are read-only and never part of `changes`.
    pub async fn save_change(&self, poll_id: i64, changes: PollChanges) -> Result<Poll> {
        self.poll_service.update_poll(poll_id, changes).await
    }

    /// Bulk `delete_model` action. Returns how many polls were deleted.
    pub async fn delete_model(&self, poll_ids: &[i64]) -> Result<usize> {
        let mut deleted = 0;
        for &poll_id in poll_ids {
            match self.poll_service.delete_poll(poll_id).await {
                Ok(()) => deleted += 1,
                Err(VotingError::NotFound(_)) => warn!("Poll #{} already gone", poll_id),
                Err(e) => return Err(e),
            }
        }
        info!("Admin deleted {} poll(s)", deleted);
        Ok(deleted)
    }

    pub async fn export(&self, query: &PollChangeListQuery) -> Result<String> {
        let rows = self.changelist(query).await?;
        export_json(POLL_ADMIN.model, &rows)
    }
}
