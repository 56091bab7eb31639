use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local mirror of a bug-tracker record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bug {
    pub id: i64,
    pub bug_id: i64,
    pub summary: String,
    pub first_comment: String,
    pub component: String,
    pub council_vote_requested: bool,
    pub updated_on: DateTime<Utc>,
}

/// Bug record as received from the tracker feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecord {
    pub bug_id: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub first_comment: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub council_vote_requested: bool,
}

impl Bug {
    /// Whether this bug asks the council for a vote in one of `components`
    pub fn qualifies_for_automated_poll(&self, components: &[String]) -> bool {
        self.council_vote_requested && components.iter().any(|c| c == &self.component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug(requested: bool, component: &str) -> Bug {
        Bug {
            id: 1,
            bug_id: 989812,
            summary: "Bug summary".to_string(),
            first_comment: String::new(),
            component: component.to_string(),
            council_vote_requested: requested,
            updated_on: Utc::now(),
        }
    }

    #[test]
    fn qualification_needs_flag_and_component() {
        let components = vec!["Budget Requests".to_string()];
        assert!(bug(true, "Budget Requests").qualifies_for_automated_poll(&components));
        assert!(!bug(false, "Budget Requests").qualifies_for_automated_poll(&components));
        assert!(!bug(true, "Swag Requests").qualifies_for_automated_poll(&components));
    }
}
