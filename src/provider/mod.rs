//! Remote content providers.
//!
//! This module provides the [`ContentProvider`] trait the tree walker
//! talks to, plus two implementations:
//!
//! | Provider | Backing store |
//! |----------|---------------|
//! | [`GitHubProvider`] | GitHub REST API (`/repos/{owner}/{repo}/contents`) |
//! | [`MemoryProvider`] | An in-memory file tree |
//!
//! # Example
//!
//! ```
//! use reposnap::model::{Credential, RepositoryLocator};
//! use reposnap::provider::{ContentProvider, MemoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = MemoryProvider::new("octocat", "hello").with_file("src/main.rs", "fn main() {}");
//!     let credential = Credential::new("token");
//!     let repo = RepositoryLocator::new("octocat", "hello");
//!
//!     let listing = provider.list_contents(&credential, &repo, "", None).await?;
//!     println!("{} entries at the root", listing.into_entries().len());
//!     Ok(())
//! }
//! ```

mod github;
mod memory;

pub use github::GitHubProvider;
pub use memory::MemoryProvider;

use crate::model::{Credential, Entry, Listing, RateLimitInfo, RepositoryLocator};
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a provider, before classification into
/// [`ScanError`](crate::ScanError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("bad credentials")]
    BadCredentials,

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("{message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Read access to a remote repository tree.
///
/// Calls are issued one at a time by the walker; implementors handle their
/// own timeouts.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Returns the human-readable name of this provider.
    fn name(&self) -> &'static str;

    /// Lists the entries at `path` (`""` is the repository root).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the repository, ref or path
    /// does not exist, and [`ProviderError::BadCredentials`] if the
    /// credential is rejected.
    async fn list_contents(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Listing, ProviderError>;

    /// Fetches the raw bytes of a file entry, already transfer-decoded.
    async fn fetch_content(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        entry: &Entry,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Returns the remaining request quota for `credential`.
    async fn rate_limit(&self, credential: &Credential) -> Result<RateLimitInfo, ProviderError>;
}
