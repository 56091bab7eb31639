pub mod bug_feed;

pub use bug_feed::load_bug_feed;
