pub mod fixtures;
pub mod test_env;

// Re-export key testing utilities
pub use fixtures::{error_body, image_body, text_only_body};
pub use test_env::TestEnvironment;
