pub mod settings;

pub use settings::{ConfigError, EmailBackend, QueueBackend, Settings};
