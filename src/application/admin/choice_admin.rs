use std::sync::Arc;

use crate::application::admin::export::export_json;
use crate::application::admin::{InlineOptions, ModelAdminOptions};
use crate::application::errors::{Result, VotingError};
use crate::domain::entities::choices::{RadioPoll, RadioPollChoice, RangePoll, RangePollChoice};
use crate::domain::repositories::poll_repository::PollRepository;

pub const RANGE_POLL_ADMIN: ModelAdminOptions = ModelAdminOptions {
    model: "RangePoll",
    list_display: &["name"],
    search_fields: &[],
    list_filter: &[],
    date_hierarchy: None,
    readonly_fields: &[],
    inlines: &[InlineOptions {
        model: "RangePollChoice",
        readonly_fields: &["votes"],
    }],
    actions: &[],
    exportable: true,
};

pub const RADIO_POLL_ADMIN: ModelAdminOptions = ModelAdminOptions {
    model: "RadioPoll",
    list_display: &["question"],
    search_fields: &[],
    list_filter: &[],
    date_hierarchy: None,
    readonly_fields: &[],
    inlines: &[InlineOptions {
        model: "RadioPollChoice",
        readonly_fields: &["votes"],
    }],
    actions: &[],
    exportable: true,
};

/// Range polls with their nominee inline. Vote totals are read-only.
pub struct RangePollAdmin {
    polls: Arc<dyn PollRepository>,
}

impl RangePollAdmin {
    pub fn new(polls: Arc<dyn PollRepository>) -> Self {
        Self { polls }
    }

    pub async fn changelist(&self) -> Result<Vec<RangePoll>> {
        Ok(self.polls.list_range_polls().await?)
    }

    pub async fn change_form(&self, range_poll_id: i64) -> Result<RangePoll> {
        self.changelist()
            .await?
            .into_iter()
            .find(|r| r.id == range_poll_id)
            .ok_or_else(|| VotingError::NotFound(format!("Range poll #{}", range_poll_id)))
    }

    pub async fn add_choice(&self, range_poll_id: i64, nominee_id: i64) -> Result<RangePollChoice> {
        Ok(self.polls.add_range_choice(range_poll_id, nominee_id).await?)
    }

    pub async fn export(&self) -> Result<String> {
        export_json(RANGE_POLL_ADMIN.model, &self.changelist().await?)
    }
}

/// Radio polls with their answers inline. Vote totals are read-only.
pub struct RadioPollAdmin {
    polls: Arc<dyn PollRepository>,
}

impl RadioPollAdmin {
    pub fn new(polls: Arc<dyn PollRepository>) -> Self {
        Self { polls }
    }

    pub async fn changelist(&self) -> Result<Vec<RadioPoll>> {
        Ok(self.polls.list_radio_polls().await?)
    }

    pub async fn change_form(&self, radio_poll_id: i64) -> Result<RadioPoll> {
        self.changelist()
            .await?
            .into_iter()
            .find(|r| r.id == radio_poll_id)
            .ok_or_else(|| VotingError::NotFound(format!("Radio poll #{}", radio_poll_id)))
    }

    pub async fn add_choice(&self, radio_poll_id: i64, answer: &str) -> Result<RadioPollChoice> {
        Ok(self.polls.add_radio_choice(radio_poll_id, answer).await?)
    }

    pub async fn export(&self) -> Result<String> {
        export_json(RADIO_POLL_ADMIN.model, &self.changelist().await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::application::errors::VotingError;
    use crate::application::test_support::TestApp;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn choices_start_with_zero_votes() {
        let app = TestApp::new().await;
        let now = Utc::now();
        let poll = app
            .create_poll("Budget", now + Duration::days(1), now + Duration::days(2))
            .await;
        let radio = app.polls.add_radio_poll(poll.id, "Approve?").await.unwrap();
        let admin = &app.admin_site.radio_polls;
        admin.add_choice(radio.id, "Yes").await.unwrap();
        admin.add_choice(radio.id, "No").await.unwrap();

        let form = admin.change_form(radio.id).await.unwrap();
        assert_eq!(form.choices.len(), 2);
        assert!(form.choices.iter().all(|c| c.votes == 0));

        let range = app.polls.add_range_poll(poll.id, "Nominees").await.unwrap();
        app.admin_site
            .range_polls
            .add_choice(range.id, app.member.id)
            .await
            .unwrap();
        let exported = app.admin_site.range_polls.export().await.unwrap();
        assert!(exported.contains("\"nominee_id\""));
    }

    #[tokio::test]
    async fn unknown_choice_set_is_not_found() {
        let app = TestApp::new().await;
        let err = app.admin_site.range_polls.change_form(7).await.unwrap_err();
        assert!(matches!(err, VotingError::NotFound(_)));
    }
}
