use std::sync::Arc;
use tracing::{error, info};

use crate::application::errors::Result;
use crate::application::services::automated_poll_service::AutomatedPollService;
use crate::domain::entities::bug::{Bug, BugRecord};
use crate::domain::repositories::bug_repository::BugRepository;

/// Stores tracker records and runs the automated poll hook on every save
pub struct BugService {
    bugs: Arc<dyn BugRepository>,
    automated: Arc<AutomatedPollService>,
}

impl BugService {
    pub fn new(bugs: Arc<dyn BugRepository>, automated: Arc<AutomatedPollService>) -> Self {
        Self { bugs, automated }
    }

    pub async fn save(&self, record: BugRecord) -> Result<Bug> {
        let bug = self.bugs.upsert(&record).await?;
        self.automated.on_bug_saved(&bug).await?;
        Ok(bug)
    }

    /// Save every record, continuing past failures. Returns how many were saved.
    pub async fn import(&self, records: Vec<BugRecord>) -> usize {
        let total = records.len();
        let mut saved = 0;
        for record in records {
            let bug_id = record.bug_id;
            match self.save(record).await {
                Ok(_) => saved += 1,
                Err(e) => error!("Failed to import bug {}: {}", bug_id, e),
            }
        }
        info!("Imported {}/{} bugs", saved, total);
        saved
    }
}
