use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::errors::{Result, VotingError};
use crate::application::services::poll_service::PollService;
use crate::domain::entities::bug::Bug;
use crate::domain::entities::choices::NewRadioPoll;
use crate::domain::entities::poll::{NewPoll, Poll};
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::config::Settings;

pub const AUTOMATED_POLL_DAYS: i64 = 3;
pub const BUDGET_QUESTION: &str = "Budget Approval";
pub const BUDGET_ANSWERS: [&str; 2] = ["Approved", "Denied"];

/// Opens a council budget poll for bugs that request one
pub struct AutomatedPollService {
    polls: Arc<dyn PollRepository>,
    users: Arc<dyn UserRepository>,
    poll_service: Arc<PollService>,
    settings: Arc<Settings>,
}

impl AutomatedPollService {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        users: Arc<dyn UserRepository>,
        poll_service: Arc<PollService>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            polls,
            users,
            poll_service,
            settings,
        }
    }

    /// Hook run after every bug save. Returns the poll only when one was created.
    pub async fn on_bug_saved(&self, bug: &Bug) -> Result<Option<Poll>> {
        if !bug.qualifies_for_automated_poll(&self.settings.automated_poll_components) {
            return Ok(None);
        }
        if let Some(existing) = self.polls.find_by_bug(bug.id).await? {
            debug!("Bug {} already has poll #{}", bug.bug_id, existing.id);
            return Ok(None);
        }

        let bot = self
            .users
            .find_by_username(&self.settings.automated_poll_bot_username)
            .await?
            .ok_or_else(|| {
                VotingError::Configuration(format!(
                    "automated poll user '{}' does not exist",
                    self.settings.automated_poll_bot_username
                ))
            })?;
        let group = self
            .users
            .find_group_by_name(&self.settings.automated_poll_group)
            .await?
            .ok_or_else(|| {
                VotingError::Configuration(format!(
                    "automated poll group '{}' does not exist",
                    self.settings.automated_poll_group
                ))
            })?;

        let start = next_midnight(Utc::now(), self.settings.time_zone);
        let mut new_poll = NewPoll::new(
            bug.summary.clone(),
            start,
            start + Duration::days(AUTOMATED_POLL_DAYS),
            group.id,
            bot.id,
        );
        new_poll.description = bug.first_comment.clone();
        new_poll.automated_poll = true;
        new_poll.bug_id = Some(bug.id);
        new_poll.radio_polls = vec![NewRadioPoll::new(BUDGET_QUESTION, &BUDGET_ANSWERS)];

        let poll = self.poll_service.create_poll(new_poll).await?;

        info!("Automated poll #{} created for bug {}", poll.id, bug.bug_id);
        Ok(Some(poll))
    }
}

/// First midnight strictly after `now` in `tz`, as UTC
pub fn next_midnight(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let tomorrow = now.with_timezone(&tz).date_naive() + Duration::days(1);
    let local = tomorrow.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&local).earliest() {
        Some(midnight) => midnight.with_timezone(&Utc),
        // midnight skipped by a DST jump; the hour after exists
        None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc()),
    }
}
