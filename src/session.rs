//! Caller-facing scan session.
//!
//! A [`Session`] holds a credential, an optional git ref and the results of
//! the last successful scan. A failed scan leaves the previous results in
//! place, except when the rate-limit guard trips: that clears them.
//!
//! # Example
//!
//! ```
//! use reposnap::provider::MemoryProvider;
//! use reposnap::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = MemoryProvider::new("pallets", "click").with_file("src/click/core.py", "...");
//!     let mut session = Session::new(provider);
//!
//!     session.authenticate("ghp_token");
//!     session.scan("https://github.com/pallets/click", None::<&[&str]>).await?;
//!
//!     println!("Found {} files", session.results().len());
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;

use tracing::info;

use crate::config::Config;
use crate::error::ScanError;
use crate::model::{Credential, RateLimitInfo, RepoInfo, ScanResult};
use crate::provider::ContentProvider;
use crate::walker::TreeWalker;

static NO_RESULTS: BTreeMap<String, String> = BTreeMap::new();

pub struct Session<P: ContentProvider> {
    provider: P,
    credential: Option<Credential>,
    git_ref: Option<String>,
    rate_limit_threshold: u64,
    last_scan: Option<ScanResult>,
}

impl<P: ContentProvider> Session<P> {
    /// Creates an unauthenticated session with default settings.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, &Config::default())
    }

    pub fn with_config(provider: P, config: &Config) -> Self {
        Self {
            provider,
            credential: None,
            git_ref: None,
            rate_limit_threshold: config.rate_limit_threshold,
            last_scan: None,
        }
    }

    /// Stores `credential` for later scans. It is not checked until the
    /// first remote call.
    pub fn authenticate(&mut self, credential: impl Into<Credential>) -> &mut Self {
        self.credential = Some(credential.into());
        self
    }

    /// Selects the branch, tag or commit to scan. `None` means the
    /// repository's default branch.
    pub fn branch(&mut self, git_ref: Option<impl Into<String>>) -> &mut Self {
        self.git_ref = git_ref.map(Into::into);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Files from the last successful scan, keyed by repository path.
    pub fn results(&self) -> &BTreeMap<String, String> {
        self.last_scan
            .as_ref()
            .map(|scan| &scan.files)
            .unwrap_or(&NO_RESULTS)
    }

    pub fn last_scan(&self) -> Option<&ScanResult> {
        self.last_scan.as_ref()
    }

    /// The repository of the last successful scan, if any since creation
    /// or the last clear.
    pub fn repository_info(&self) -> Option<&RepoInfo> {
        self.last_scan.as_ref().map(|scan| &scan.repository)
    }

    /// Scans `locator` and replaces the stored results on success.
    ///
    /// `extensions` restricts the scan to a subset of the recognized
    /// extensions; `Some(&[])` matches nothing.
    ///
    /// # Errors
    ///
    /// - [`ScanError::NotAuthenticated`] without a credential
    /// - [`ScanError::InvalidLocator`] / [`ScanError::InvalidFilter`] for bad input
    /// - [`ScanError::InvalidCredential`], [`ScanError::RepositoryNotFound`] or
    ///   [`ScanError::RemoteService`] from the provider
    /// - [`ScanError::RateLimitExceeded`], which also clears stored results
    pub async fn scan<S: AsRef<str>>(
        &mut self,
        locator: &str,
        extensions: Option<&[S]>,
    ) -> Result<&ScanResult, ScanError> {
        let credential = self.credential.as_ref().ok_or(ScanError::NotAuthenticated)?;

        let outcome = TreeWalker::new(&self.provider, credential)
            .with_rate_limit_threshold(self.rate_limit_threshold)
            .with_ref(self.git_ref.as_deref())
            .scan(locator, extensions)
            .await;

        match outcome {
            Ok(result) => {
                info!(
                    repository = %result.repository.full_name(),
                    files = result.files.len(),
                    "stored scan results"
                );
                Ok(self.last_scan.insert(result))
            }
            Err(err) => {
                if err.is_rate_limited() {
                    self.last_scan = None;
                }
                Err(err)
            }
        }
    }

    /// Queries the provider for the credential's remaining quota.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotAuthenticated`] without a credential, and
    /// [`ScanError::InvalidCredential`] or [`ScanError::RemoteService`] if
    /// the provider call fails.
    pub async fn rate_limit_status(&self) -> Result<RateLimitInfo, ScanError> {
        let credential = self.credential.as_ref().ok_or(ScanError::NotAuthenticated)?;
        self.provider
            .rate_limit(credential)
            .await
            .map_err(ScanError::from_provider_unscoped)
    }

    /// Drops results, the last repository and the selected ref; keeps the
    /// credential.
    pub fn clear_results(&mut self) {
        self.last_scan = None;
        self.git_ref = None;
    }

    /// Like [`clear_results`](Self::clear_results), and also forgets the
    /// credential.
    pub fn clear_all(&mut self) {
        self.clear_results();
        self.credential = None;
    }
}

impl<P: ContentProvider> std::fmt::Display for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.credential {
            Some(credential) => format!("authenticated, token='{}'", credential.masked()),
            None => "not authenticated".to_string(),
        };
        match &self.last_scan {
            Some(scan) => write!(
                f,
                "Session({}, repo={}, files={})",
                auth,
                scan.repository.full_name(),
                scan.files.len()
            ),
            None => write!(f, "Session({}, no scans yet)", auth),
        }
    }
}
