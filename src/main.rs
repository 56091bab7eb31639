use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};

use reps_voting::domain::repositories::mailer::Mailer;
use reps_voting::domain::repositories::task_queue::TaskQueue;
use reps_voting::infrastructure::bootstrap::AppContext;
use reps_voting::infrastructure::bugzilla::load_bug_feed;
use reps_voting::infrastructure::config::{EmailBackend, QueueBackend, Settings};
use reps_voting::infrastructure::database::DatabaseManager;
use reps_voting::infrastructure::fixtures::{load_users, load_users_fixture};
use reps_voting::infrastructure::mail::{ConsoleMailer, FileMailer};
use reps_voting::infrastructure::task_queue::{MemoryTaskQueue, SqliteTaskQueue, TaskWorker};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    reps_voting::utils::setup_logging(settings.log_level);

    if let Err(e) = run(settings).await {
        error!("Error running voting service: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);

    let db = DatabaseManager::new(&settings.database_path)?;
    db.initialize_database().await?;
    info!("Database ready at {}", settings.database_path.display());

    let task_queue: Arc<dyn TaskQueue> = match settings.queue_backend {
        QueueBackend::Sqlite => Arc::new(SqliteTaskQueue::new(db.clone())),
        QueueBackend::Memory => Arc::new(MemoryTaskQueue::new()),
    };
    let mailer: Arc<dyn Mailer> = match settings.email_backend {
        EmailBackend::Console => Arc::new(ConsoleMailer::new()),
        EmailBackend::File => Arc::new(FileMailer::new(settings.email_file_path.clone())),
    };

    let app = AppContext::build(settings.clone(), db, task_queue, mailer);

    if let Some(path) = &settings.users_fixture_path {
        let users = load_users_fixture(path)?;
        load_users(app.users.as_ref(), &users)
            .await
            .context("Failed to load users fixture")?;
    }

    if let Some(path) = &settings.bug_feed_path {
        let records = load_bug_feed(path)?;
        app.bug_service.import(records).await;
    }

    let models: Vec<&str> = app.admin_site.registry().iter().map(|m| m.model).collect();
    info!("Admin models registered: {}", models.join(", "));

    let overdue = TaskWorker::drain_due(&app.task_queue, &app.runner)
        .await
        .context("Failed to run overdue tasks")?;
    if overdue > 0 {
        info!("Ran {} overdue task(s)", overdue);
    }

    let worker = TaskWorker::start(app.task_queue.clone(), app.runner.clone());
    info!(
        "Voting worker started (eager: {}, queue: {:?}, email: {:?})",
        settings.task_always_eager, settings.queue_backend, settings.email_backend
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    warn!("Shutdown requested");
    worker.abort();
    Ok(())
}
