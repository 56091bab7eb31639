pub mod admin;
pub mod errors;
pub mod services;
pub mod tasks;
pub mod templates;

#[cfg(test)]
pub mod test_support;
