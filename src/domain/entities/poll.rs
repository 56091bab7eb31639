use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::entities::choices::NewRadioPoll;
use crate::domain::entities::scheduled_job::ReminderKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub valid_group_id: i64,
    pub created_on: DateTime<Utc>,
    pub created_by_id: i64,
    pub automated_poll: bool,
    pub is_extended: bool,
    pub comments_allowed: bool,
    /// Primary key of the linked bug record, not the external bug number
    pub bug_id: Option<i64>,
    pub task_start_id: Option<String>,
    pub task_end_id: Option<String>,
}

impl Poll {
    /// Voting has not started yet
    pub fn is_future_voting(&self, now: DateTime<Utc>) -> bool {
        self.start > now
    }

    pub fn is_current_voting(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn is_past_voting(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }

    /// Non-null scheduled task ids, end task first
    pub fn scheduled_task_ids(&self) -> Vec<&str> {
        [self.task_end_id.as_deref(), self.task_start_id.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Id of the reminder currently scheduled for `kind`
    pub fn reminder_task_id(&self, kind: ReminderKind) -> Option<&str> {
        match kind {
            ReminderKind::Start => self.task_start_id.as_deref(),
            ReminderKind::End => self.task_end_id.as_deref(),
        }
    }
}

impl fmt::Display for Poll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fields accepted when creating a poll
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub name: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub valid_group_id: i64,
    pub created_by_id: i64,
    pub automated_poll: bool,
    pub comments_allowed: bool,
    pub bug_id: Option<i64>,
    /// Radio polls stored in the same transaction as the poll
    pub radio_polls: Vec<NewRadioPoll>,
}

impl NewPoll {
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        valid_group_id: i64,
        created_by_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start,
            end,
            valid_group_id,
            created_by_id,
            automated_poll: false,
            comments_allowed: true,
            bug_id: None,
            radio_polls: Vec::new(),
        }
    }
}

/// Editable poll fields. Task ids and vote counts are intentionally absent.
#[derive(Debug, Clone, Default)]
pub struct PollChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub valid_group_id: Option<i64>,
    pub comments_allowed: Option<bool>,
}

impl PollChanges {
    pub fn apply(self, poll: &mut Poll) {
        if let Some(name) = self.name {
            poll.name = name;
        }
        if let Some(description) = self.description {
            poll.description = description;
        }
        if let Some(start) = self.start {
            poll.start = start;
        }
        if let Some(end) = self.end {
            poll.end = end;
        }
        if let Some(group) = self.valid_group_id {
            poll.valid_group_id = group;
        }
        if let Some(allowed) = self.comments_allowed {
            poll.comments_allowed = allowed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(start: DateTime<Utc>, end: DateTime<Utc>) -> Poll {
        Poll {
            id: 1,
            name: "poll".to_string(),
            description: String::new(),
            start,
            end,
            valid_group_id: 1,
            created_on: start,
            created_by_id: 1,
            automated_poll: false,
            is_extended: false,
            comments_allowed: true,
            bug_id: None,
            task_start_id: None,
            task_end_id: Some("end".to_string()),
        }
    }

    #[test]
    fn voting_window() {
        let now = Utc::now();
        let p = poll(now - Duration::days(1), now + Duration::days(1));
        assert!(p.is_current_voting(now));
        assert!(!p.is_future_voting(now));
        assert!(!p.is_past_voting(now));
        assert!(p.is_past_voting(now + Duration::days(2)));
    }

    #[test]
    fn scheduled_task_ids_skip_missing() {
        let now = Utc::now();
        let p = poll(now, now + Duration::days(1));
        assert_eq!(p.scheduled_task_ids(), vec!["end"]);
        assert_eq!(p.reminder_task_id(ReminderKind::End), Some("end"));
        assert_eq!(p.reminder_task_id(ReminderKind::Start), None);
    }

    #[test]
    fn changes_only_touch_given_fields() {
        let now = Utc::now();
        let mut p = poll(now, now + Duration::days(1));
        PollChanges {
            name: Some("Edit Voting".to_string()),
            ..Default::default()
        }
        .apply(&mut p);
        assert_eq!(p.name, "Edit Voting");
        assert_eq!(p.task_end_id.as_deref(), Some("end"));
    }
}
