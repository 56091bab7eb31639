use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::application::errors::{Result, VotingError};
use crate::domain::entities::choices::{RadioPoll, RangePoll};
use crate::domain::entities::poll::Poll;
use crate::domain::entities::vote::{Ballot, Vote};
use crate::domain::repositories::error::RepositoryError;
use crate::domain::repositories::poll_repository::PollRepository;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::repositories::vote_repository::VoteRepository;

#[derive(Debug, Clone, Serialize)]
pub struct PollResults {
    pub poll: Poll,
    pub votes_cast: i64,
    pub radio_polls: Vec<RadioPoll>,
    pub range_polls: Vec<RangePoll>,
}

pub struct VotingService {
    polls: Arc<dyn PollRepository>,
    users: Arc<dyn UserRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl VotingService {
    pub fn new(
        polls: Arc<dyn PollRepository>,
        users: Arc<dyn UserRepository>,
        votes: Arc<dyn VoteRepository>,
    ) -> Self {
        Self { polls, users, votes }
    }

    pub async fn cast_radio_vote(&self, poll_id: i64, user_id: i64, choice_id: i64) -> Result<Vote> {
        let poll = self.open_poll_for(poll_id, user_id).await?;

        let radios = self.polls.radio_polls(poll.id).await?;
        if !radios.iter().any(|r| r.choice(choice_id).is_some()) {
            return Err(VotingError::Validation(format!(
                "Choice #{} does not belong to poll #{}",
                choice_id, poll.id
            )));
        }

        self.record(&poll, user_id, Ballot::Radio { choice_id }).await
    }

    /// `scores` pairs a range choice id with the score given to that nominee
    pub async fn cast_range_vote(
        &self,
        poll_id: i64,
        user_id: i64,
        scores: Vec<(i64, i64)>,
    ) -> Result<Vote> {
        let poll = self.open_poll_for(poll_id, user_id).await?;

        if scores.is_empty() {
            return Err(VotingError::Validation("Ballot is empty".into()));
        }
        let ranges = self.polls.range_polls(poll.id).await?;
        let mut seen = HashSet::new();
        for (choice_id, score) in &scores {
            if *score < 0 {
                return Err(VotingError::Validation(format!(
                    "Negative score for choice #{}",
                    choice_id
                )));
            }
            if !seen.insert(*choice_id) {
                return Err(VotingError::Validation(format!(
                    "Choice #{} scored twice",
                    choice_id
                )));
            }
            if !ranges.iter().any(|r| r.choice(*choice_id).is_some()) {
                return Err(VotingError::Validation(format!(
                    "Choice #{} does not belong to poll #{}",
                    choice_id, poll.id
                )));
            }
        }

        self.record(&poll, user_id, Ballot::Range { scores }).await
    }

    pub async fn results(&self, poll_id: i64) -> Result<PollResults> {
        let poll = self
            .polls
            .get(poll_id)
            .await?
            .ok_or_else(|| VotingError::NotFound(format!("Poll #{}", poll_id)))?;

        Ok(PollResults {
            votes_cast: self.votes.count_for_poll(poll.id).await?,
            radio_polls: self.polls.radio_polls(poll.id).await?,
            range_polls: self.polls.range_polls(poll.id).await?,
            poll,
        })
    }

    async fn open_poll_for(&self, poll_id: i64, user_id: i64) -> Result<Poll> {
        let poll = self
            .polls
            .get(poll_id)
            .await?
            .ok_or_else(|| VotingError::NotFound(format!("Poll #{}", poll_id)))?;

        if !poll.is_current_voting(Utc::now()) {
            return Err(VotingError::VotingClosed);
        }
        if !self.users.is_member(user_id, poll.valid_group_id).await? {
            return Err(VotingError::NotAllowed(format!(
                "User #{} is not in the poll's group",
                user_id
            )));
        }
        if self.votes.has_voted(poll.id, user_id).await? {
            return Err(VotingError::AlreadyVoted);
        }
        Ok(poll)
    }

    async fn record(&self, poll: &Poll, user_id: i64, ballot: Ballot) -> Result<Vote> {
        // the unique index still catches a concurrent second vote
        let vote = match self.votes.record(poll.id, user_id, Utc::now(), &ballot).await {
            Err(RepositoryError::AlreadyExists) => return Err(VotingError::AlreadyVoted),
            other => other?,
        };
        info!("User #{} voted in poll #{}", user_id, poll.id);
        Ok(vote)
    }
}
