pub mod choice_admin;
pub mod export;
pub mod poll_admin;
pub mod vote_admin;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

pub use choice_admin::{RadioPollAdmin, RangePollAdmin};
pub use poll_admin::{PollAdmin, PollChangeListQuery, PollFilters};
pub use vote_admin::VoteAdmin;

/// Static description of how a model shows up in the admin
#[derive(Debug, Clone, Copy)]
pub struct ModelAdminOptions {
    pub model: &'static str,
    pub list_display: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub date_hierarchy: Option<&'static str>,
    pub readonly_fields: &'static [&'static str],
    pub inlines: &'static [InlineOptions],
    pub actions: &'static [&'static str],
    pub exportable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InlineOptions {
    pub model: &'static str,
    pub readonly_fields: &'static [&'static str],
}

/// Every term of `query` must match at least one of `fields`, ignoring case
pub fn matches_search<S: AsRef<str>>(fields: &[S], query: &str) -> bool {
    let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_lowercase()).collect();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| fields.iter().any(|f| f.contains(&term)))
}

/// Year, month and day drill-down over a date field
#[derive(Debug, Clone, Copy, Default)]
pub struct DateDrilldown {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateDrilldown {
    pub fn matches(&self, at: DateTime<Utc>, tz: Tz) -> bool {
        let local = at.with_timezone(&tz);
        self.year.is_none_or(|y| local.year() == y)
            && self.month.is_none_or(|m| local.month() == m)
            && self.day.is_none_or(|d| local.day() == d)
    }
}

/// Registry of the voting admins
pub struct AdminSite {
    pub polls: PollAdmin,
    pub votes: VoteAdmin,
    pub range_polls: RangePollAdmin,
    pub radio_polls: RadioPollAdmin,
}

impl AdminSite {
    pub fn registry(&self) -> [&'static ModelAdminOptions; 4] {
        [
            &vote_admin::VOTE_ADMIN,
            &choice_admin::RANGE_POLL_ADMIN,
            &choice_admin::RADIO_POLL_ADMIN,
            &poll_admin::POLL_ADMIN,
        ]
    }
}
