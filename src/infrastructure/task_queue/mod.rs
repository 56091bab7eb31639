pub mod memory_task_queue;
pub mod sqlite_task_queue;
pub mod worker;

pub use memory_task_queue::MemoryTaskQueue;
pub use sqlite_task_queue::SqliteTaskQueue;
pub use worker::TaskWorker;
