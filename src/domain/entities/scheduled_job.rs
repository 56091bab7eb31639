use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::entities::email::EmailMessage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReminderKind {
    Start,
    End,
}

/// Work item executed by the background worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Job {
    SendMail(EmailMessage),
    VotingReminder { poll_id: i64, kind: ReminderKind },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::SendMail(_) => "send_mail",
            Job::VotingReminder { .. } => "voting_reminder",
        }
    }
}

/// Job queued for execution at `eta`
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub task_id: String,
    pub eta: DateTime<Utc>,
    pub job: Job,
}

impl ScheduledJob {
    pub fn new(task_id: String, eta: DateTime<Utc>, job: Job) -> Self {
        Self { task_id, eta, job }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.eta <= now
    }
}

// ordering for the priority queue: earliest eta has the highest priority
impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .eta
            .cmp(&self.eta)
            .then_with(|| other.task_id.cmp(&self.task_id))
    }
}

impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id
    }
}

impl Eq for ScheduledJob {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BinaryHeap;

    fn reminder(task_id: &str, eta: DateTime<Utc>) -> ScheduledJob {
        ScheduledJob::new(
            task_id.to_string(),
            eta,
            Job::VotingReminder {
                poll_id: 1,
                kind: ReminderKind::Start,
            },
        )
    }

    #[test]
    fn earliest_eta_pops_first() {
        let now = Utc::now();
        let mut heap = BinaryHeap::new();
        heap.push(reminder("late", now + Duration::hours(2)));
        heap.push(reminder("early", now + Duration::hours(1)));
        assert_eq!(heap.pop().map(|j| j.task_id), Some("early".to_string()));
    }

    #[test]
    fn equal_etas_pop_by_task_id() {
        let now = Utc::now();
        let mut heap = BinaryHeap::new();
        heap.push(reminder("b", now));
        heap.push(reminder("a", now));
        assert_eq!(heap.pop().map(|j| j.task_id), Some("a".to_string()));
    }
}
