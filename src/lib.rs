pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod provider;
pub mod session;
pub mod walker;

pub use config::Config;
pub use error::ScanError;
pub use filter::should_scan;
pub use model::{Credential, RateLimitInfo, RepoInfo, RepositoryLocator, ScanResult};
pub use provider::ContentProvider;
pub use session::Session;
