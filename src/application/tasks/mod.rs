pub mod dispatcher;
pub mod runner;

pub use dispatcher::TaskDispatcher;
pub use runner::JobRunner;
