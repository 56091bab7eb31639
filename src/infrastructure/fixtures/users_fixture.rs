use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::entities::user::NewUser;
use crate::domain::repositories::user_repository::UserRepository;

/// Parse a JSON array of directory users
pub fn load_users_fixture(path: &Path) -> Result<Vec<NewUser>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read users fixture {}", path.display()))?;
    let users: Vec<NewUser> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid users fixture {}", path.display()))?;
    Ok(users)
}

/// Create the fixture users that do not exist yet. Returns how many were created.
pub async fn load_users(repo: &dyn UserRepository, users: &[NewUser]) -> Result<usize> {
    let mut created = 0;
    for user in users {
        if repo.find_by_username(&user.username).await?.is_some() {
            debug!("User '{}' already loaded", user.username);
            continue;
        }
        repo.create_user(user).await?;
        created += 1;
    }
    info!("Loaded {} new user(s) from fixture", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseManager;
    use crate::infrastructure::repositories::SqliteUserRepository;

    #[tokio::test]
    async fn loads_fixture_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(
            &path,
            r#"[
                {"username": "remobot", "first_name": "Remo", "last_name": "Bot",
                 "email": "remobot@example.org"},
                {"username": "jane", "first_name": "Jane", "last_name": "Doe",
                 "email": "jane@example.org", "receive_email_on_add_voting_comment": true,
                 "groups": ["Council", "Rep"]}
            ]"#,
        )
        .unwrap();

        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();
        let repo = SqliteUserRepository::new(db);

        let users = load_users_fixture(&path).unwrap();
        assert_eq!(load_users(&repo, &users).await.unwrap(), 2);
        assert_eq!(load_users(&repo, &users).await.unwrap(), 0);

        let council = repo.find_group_by_name("Council").await.unwrap().unwrap();
        let members = repo.members_of_group(council.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert!(members[0].receive_email_on_add_voting_comment);
    }
}
