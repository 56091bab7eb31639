pub mod bootstrap;
pub mod bugzilla;
pub mod config;
pub mod database;
pub mod fixtures;
pub mod mail;
pub mod repositories;
pub mod task_queue;
