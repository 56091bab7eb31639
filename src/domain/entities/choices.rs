use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangePoll {
    pub id: i64,
    pub poll_id: i64,
    pub name: String,
    pub choices: Vec<RangePollChoice>,
}

/// Nominee in a range poll; `votes` is the sum of scores cast for them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangePollChoice {
    pub id: i64,
    pub range_poll_id: i64,
    pub nominee_id: i64,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioPoll {
    pub id: i64,
    pub poll_id: i64,
    pub question: String,
    pub choices: Vec<RadioPollChoice>,
}

/// Question and answers inserted together with a new poll
#[derive(Debug, Clone, PartialEq)]
pub struct NewRadioPoll {
    pub question: String,
    pub answers: Vec<String>,
}

impl NewRadioPoll {
    pub fn new(question: impl Into<String>, answers: &[&str]) -> Self {
        Self {
            question: question.into(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioPollChoice {
    pub id: i64,
    pub radio_poll_id: i64,
    pub answer: String,
    pub votes: i64,
}

impl RadioPoll {
    pub fn choice(&self, choice_id: i64) -> Option<&RadioPollChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

impl RangePoll {
    pub fn choice(&self, choice_id: i64) -> Option<&RangePollChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}
