pub mod sqlite_bug_repository;
pub mod sqlite_comment_repository;
pub mod sqlite_poll_repository;
pub mod sqlite_user_repository;
pub mod sqlite_vote_repository;
pub mod timestamps;

pub use sqlite_bug_repository::SqliteBugRepository;
pub use sqlite_comment_repository::SqliteCommentRepository;
pub use sqlite_poll_repository::SqlitePollRepository;
pub use sqlite_user_repository::SqliteUserRepository;
pub use sqlite_vote_repository::SqliteVoteRepository;
