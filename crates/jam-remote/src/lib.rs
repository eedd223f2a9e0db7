mod github;

pub use github::{GitHubSource, DEFAULT_API_BASE_URL};
