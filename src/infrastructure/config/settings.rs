use chrono_tz::Tz;
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    /// Log every message through tracing
    Console,
    /// Write every message as a JSON file under `email_file_path`
    File,
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid value for {}: '{}'", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub log_level: Level,
    pub from_email: String,
    pub council_alias: String,
    pub site_url: String,
    pub bugzilla_url: String,
    pub time_zone: Tz,
    /// Run immediate jobs inline instead of queueing them
    pub task_always_eager: bool,
    pub queue_backend: QueueBackend,
    pub email_backend: EmailBackend,
    pub email_file_path: PathBuf,
    pub automated_poll_bot_username: String,
    pub automated_poll_group: String,
    pub automated_poll_components: Vec<String>,
    pub users_fixture_path: Option<PathBuf>,
    pub bug_feed_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/voting.db"),
            log_level: Level::INFO,
            from_email: "reps-noreply@example.org".to_string(),
            council_alias: "reps-council@example.org".to_string(),
            site_url: "http://localhost:8000".to_string(),
            bugzilla_url: "https://bugzilla.mozilla.org/show_bug.cgi?id=".to_string(),
            time_zone: Tz::UTC,
            task_always_eager: false,
            queue_backend: QueueBackend::Sqlite,
            email_backend: EmailBackend::Console,
            email_file_path: PathBuf::from("data/outbox"),
            automated_poll_bot_username: "remobot".to_string(),
            automated_poll_group: "Council".to_string(),
            automated_poll_components: vec!["Budget Requests".to_string()],
            users_fixture_path: None,
            bug_feed_path: None,
        }
    }
}

impl Settings {
    /// Build settings from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = lookup("DATABASE_PATH") {
            settings.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            settings.log_level = v.parse::<Level>().map_err(|_| ConfigError {
                key: "LOG_LEVEL",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("FROM_EMAIL") {
            settings.from_email = v;
        }
        if let Some(v) = lookup("REPS_COUNCIL_ALIAS") {
            settings.council_alias = v;
        }
        if let Some(v) = lookup("SITE_URL") {
            settings.site_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("BUGZILLA_URL") {
            settings.bugzilla_url = v;
        }
        if let Some(v) = lookup("TIME_ZONE") {
            settings.time_zone = v.parse::<Tz>().map_err(|_| ConfigError {
                key: "TIME_ZONE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("TASK_ALWAYS_EAGER") {
            settings.task_always_eager = parse_bool("TASK_ALWAYS_EAGER", &v)?;
        }
        if let Some(v) = lookup("TASK_QUEUE_BACKEND") {
            settings.queue_backend = match v.to_lowercase().as_str() {
                "sqlite" => QueueBackend::Sqlite,
                "memory" => QueueBackend::Memory,
                _ => {
                    return Err(ConfigError {
                        key: "TASK_QUEUE_BACKEND",
                        value: v,
                    });
                }
            };
        }
        if let Some(v) = lookup("EMAIL_BACKEND") {
            settings.email_backend = match v.to_lowercase().as_str() {
                "console" => EmailBackend::Console,
                "file" => EmailBackend::File,
                _ => {
                    return Err(ConfigError {
                        key: "EMAIL_BACKEND",
                        value: v,
                    });
                }
            };
        }
        if let Some(v) = lookup("EMAIL_FILE_PATH") {
            settings.email_file_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("AUTOMATED_POLL_BOT_USERNAME") {
            settings.automated_poll_bot_username = v;
        }
        if let Some(v) = lookup("AUTOMATED_POLL_GROUP") {
            settings.automated_poll_group = v;
        }
        if let Some(v) = lookup("AUTOMATED_POLL_COMPONENTS") {
            settings.automated_poll_components = v
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        settings.users_fixture_path = lookup("USERS_FIXTURE_PATH").map(PathBuf::from);
        settings.bug_feed_path = lookup("BUG_FEED_PATH").map(PathBuf::from);

        Ok(settings)
    }

    /// Link to a bug in the tracker
    pub fn bug_url(&self, bug_id: i64) -> String {
        format!("{}{}", self.bugzilla_url, bug_id)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.automated_poll_bot_username, "remobot");
        assert_eq!(settings.automated_poll_components, vec!["Budget Requests"]);
        assert!(!settings.task_always_eager);
        assert_eq!(settings.queue_backend, QueueBackend::Sqlite);
    }

    #[test]
    fn reads_overrides() {
        let settings = settings_from(&[
            ("TASK_ALWAYS_EAGER", "true"),
            ("TIME_ZONE", "Europe/Berlin"),
            ("AUTOMATED_POLL_COMPONENTS", "Budget Requests, Swag Requests,"),
            ("SITE_URL", "https://reps.example.org/"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert!(settings.task_always_eager);
        assert_eq!(settings.time_zone, chrono_tz::Europe::Berlin);
        assert_eq!(
            settings.automated_poll_components,
            vec!["Budget Requests", "Swag Requests"]
        );
        assert_eq!(settings.site_url, "https://reps.example.org");
        assert_eq!(settings.log_level, Level::DEBUG);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings_from(&[("TIME_ZONE", "Mars/Olympus")]).is_err());
        assert!(settings_from(&[("TASK_ALWAYS_EAGER", "maybe")]).is_err());
        let err = settings_from(&[("EMAIL_BACKEND", "smtp")]).unwrap_err();
        assert_eq!(err.key, "EMAIL_BACKEND");
    }

    #[test]
    fn bug_url_appends_id() {
        let settings = Settings::default();
        assert_eq!(
            settings.bug_url(989812),
            "https://bugzilla.mozilla.org/show_bug.cgi?id=989812"
        );
    }
}
