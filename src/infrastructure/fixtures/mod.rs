pub mod users_fixture;

pub use users_fixture::{load_users, load_users_fixture};
