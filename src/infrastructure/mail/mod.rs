pub mod console_mailer;
pub mod file_mailer;

pub use console_mailer::ConsoleMailer;
pub use file_mailer::FileMailer;
