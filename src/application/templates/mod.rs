//! Plain-text email bodies keyed by template path.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    NewPoll,
    PollEdited,
    StartingReminder,
    ResultsReminder,
    VotingExtended,
    BudgetDiscussion,
    PollComment,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 7] = [
        EmailTemplate::NewPoll,
        EmailTemplate::PollEdited,
        EmailTemplate::StartingReminder,
        EmailTemplate::ResultsReminder,
        EmailTemplate::VotingExtended,
        EmailTemplate::BudgetDiscussion,
        EmailTemplate::PollComment,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            EmailTemplate::NewPoll => "emails/voting_new_poll.txt",
            EmailTemplate::PollEdited => "emails/voting_edited.txt",
            EmailTemplate::StartingReminder => "emails/voting_starting_reminder.txt",
            EmailTemplate::ResultsReminder => "emails/voting_results_reminder.txt",
            EmailTemplate::VotingExtended => "emails/voting_extended.txt",
            EmailTemplate::BudgetDiscussion => "emails/review_budget_notify_council.txt",
            EmailTemplate::PollComment => "emails/user_notification_on_add_poll_comment.txt",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.path() == path)
    }

    pub fn render(&self, context: &Value) -> String {
        let poll = text(context, &["poll", "name"]);
        let link = poll_link(context);
        match self {
            EmailTemplate::NewPoll => format!(
                "A new voting \"{}\" has been created.\n\n{}\n\nVoting opens {} and closes {}.\nCast your vote at {}\n",
                poll,
                text(context, &["poll", "description"]),
                text(context, &["start"]),
                text(context, &["end"]),
                link
            ),
            EmailTemplate::PollEdited => format!(
                "The voting \"{}\" has been updated.\n\nVoting opens {} and closes {}.\nDetails: {}\n",
                poll,
                text(context, &["start"]),
                text(context, &["end"]),
                link
            ),
            EmailTemplate::StartingReminder => format!(
                "The voting \"{}\" is now open until {}.\nCast your vote at {}\n",
                poll,
                text(context, &["end"]),
                link
            ),
            EmailTemplate::ResultsReminder => format!(
                "The voting \"{}\" has ended.\nSee the results at {}\n",
                poll, link
            ),
            EmailTemplate::VotingExtended => format!(
                "Not enough council members have voted on \"{}\" yet.\nThe voting period has been extended until {}.\nCast your vote at {}\n",
                poll,
                text(context, &["end"]),
                link
            ),
            EmailTemplate::BudgetDiscussion => {
                let bug_id = text(context, &["bug", "bug_id"]);
                format!(
                    "A new budget request needs the council's review.\n\nBug {}: {}\n{}{}\n\nThe automated poll \"{}\" has been created for it; please discuss it before voting starts.\n",
                    bug_id,
                    text(context, &["bug", "summary"]),
                    text(context, &["BUGZILLA_URL"]),
                    bug_id,
                    poll
                )
            }
            EmailTemplate::PollComment => format!(
                "{} commented on \"{}\":\n\n{}\n\nReply at {}\n",
                text(context, &["commenter"]),
                poll,
                text(context, &["comment"]),
                link
            ),
        }
    }
}

/// Render by template path; unknown paths fall back to a dump of the context.
pub fn render(path: &str, context: &Value) -> String {
    match EmailTemplate::from_path(path) {
        Some(template) => template.render(context),
        None => context.to_string(),
    }
}

fn text(context: &Value, path: &[&str]) -> String {
    let mut value = context;
    for key in path {
        match value.get(key) {
            Some(v) => value = v,
            None => return String::new(),
        }
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn poll_link(context: &Value) -> String {
    format!(
        "{}/voting/{}/",
        text(context, &["SITE_URL"]),
        text(context, &["poll", "id"])
    )
}
