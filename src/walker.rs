//! Remote tree traversal.
//!
//! [`TreeWalker`] enumerates a repository through a [`ContentProvider`],
//! keeps the files accepted by the [path filter](crate::filter), fetches
//! and decodes them, and returns one flat path-to-text map.
//!
//! The walk uses an explicit stack of directory paths, so deep trees do not
//! grow the call stack. Requests are issued one at a time.
//!
//! # Example
//!
//! ```
//! use reposnap::model::Credential;
//! use reposnap::provider::MemoryProvider;
//! use reposnap::walker::TreeWalker;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = MemoryProvider::new("owner", "repo")
//!         .with_file("a.py", "x")
//!         .with_file("node_modules/b.js", "y");
//!     let credential = Credential::new("token");
//!
//!     let result = TreeWalker::new(&provider, &credential)
//!         .scan("owner/repo", None::<&[&str]>)
//!         .await?;
//!     assert_eq!(result.files.len(), 1);
//!     Ok(())
//! }
//! ```

use std::collections::btree_map::Entry as MapEntry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ScanError;
use crate::filter::{is_scannable, ExtensionFilter};
use crate::model::{Credential, Entry, EntryKind, RepoInfo, RepositoryLocator, ScanResult};
use crate::provider::{ContentProvider, ProviderError};

/// Why a file accepted by the filter did not make it into the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The bytes are not valid UTF-8 (binary content).
    NotUtf8,
    FetchFailed(ProviderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Text(String),
    Skipped(SkipReason),
}

/// Decodes fetched bytes as UTF-8 text.
pub fn decode_text(bytes: Vec<u8>) -> FileOutcome {
    match String::from_utf8(bytes) {
        Ok(text) => FileOutcome::Text(text),
        Err(_) => FileOutcome::Skipped(SkipReason::NotUtf8),
    }
}

pub struct TreeWalker<'a, P: ContentProvider + ?Sized> {
    provider: &'a P,
    credential: &'a Credential,
    rate_limit_threshold: u64,
    git_ref: Option<&'a str>,
}

impl<'a, P: ContentProvider + ?Sized> TreeWalker<'a, P> {
    pub fn new(provider: &'a P, credential: &'a Credential) -> Self {
        Self {
            provider,
            credential,
            rate_limit_threshold: Config::default().rate_limit_threshold,
            git_ref: None,
        }
    }

    /// Remaining quota below `threshold` aborts the walk.
    pub fn with_rate_limit_threshold(mut self, threshold: u64) -> Self {
        self.rate_limit_threshold = threshold;
        self
    }

    /// Walks `git_ref` instead of the default branch.
    pub fn with_ref(mut self, git_ref: Option<&'a str>) -> Self {
        self.git_ref = git_ref;
        self
    }

    /// Parses `locator`, validates `extensions` and walks the repository.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidLocator`] or [`ScanError::InvalidFilter`]
    /// before any request is made, otherwise whatever [`walk`](Self::walk)
    /// returns.
    pub async fn scan<S: AsRef<str>>(
        &self,
        locator: &str,
        extensions: Option<&[S]>,
    ) -> Result<ScanResult, ScanError> {
        let repo = RepositoryLocator::parse(locator)?;
        let filter = extensions.map(ExtensionFilter::new).transpose()?;

        let files = self.walk(&repo, filter.as_ref()).await?;

        Ok(ScanResult::new(
            RepoInfo::new(&repo, locator),
            self.git_ref.map(str::to_string),
            files,
        ))
    }

    /// Visits every directory reachable from the repository root and
    /// returns the decoded text of each accepted file, keyed by path.
    ///
    /// # Errors
    ///
    /// Any provider failure while listing a directory or checking the rate
    /// limit aborts the walk. Failures fetching or decoding a single file do
    /// not; the file is left out.
    pub async fn walk(
        &self,
        repo: &RepositoryLocator,
        filter: Option<&ExtensionFilter>,
    ) -> Result<BTreeMap<String, String>, ScanError> {
        info!(
            repository = %repo,
            git_ref = self.git_ref.unwrap_or("default"),
            provider = self.provider.name(),
            "scanning repository"
        );

        let mut files = BTreeMap::new();
        let mut visited = BTreeSet::new();
        let mut pending = vec![String::new()];

        while let Some(dir) = pending.pop() {
            if !visited.insert(dir.clone()) {
                continue;
            }

            self.guard_rate_limit().await?;

            debug!(path = %dir, "listing directory");
            let entries = self
                .provider
                .list_contents(self.credential, repo, &dir, self.git_ref)
                .await
                .map_err(|e| ScanError::from_provider(e, repo))?
                .into_entries();

            let mut subdirs = Vec::new();
            for entry in entries {
                match entry.kind {
                    EntryKind::Dir => subdirs.push(entry.path),
                    EntryKind::File => {
                        if !is_scannable(&entry.path, filter) {
                            continue;
                        }
                        match self.read_file(repo, &entry).await {
                            FileOutcome::Text(text) => insert_unique(&mut files, entry.path, text),
                            FileOutcome::Skipped(reason) => {
                                debug!(path = %entry.path, ?reason, "skipping file");
                            }
                        }
                    }
                    EntryKind::Other => {
                        debug!(path = %entry.path, "ignoring entry that is neither file nor directory");
                    }
                }
            }

            // Reversed so directories are popped in listing order.
            pending.extend(subdirs.into_iter().rev());
        }

        info!(repository = %repo, files = files.len(), "scan complete");
        Ok(files)
    }

    async fn guard_rate_limit(&self) -> Result<(), ScanError> {
        let status = self
            .provider
            .rate_limit(self.credential)
            .await
            .map_err(ScanError::from_provider_unscoped)?;

        if status.remaining < self.rate_limit_threshold {
            warn!(
                remaining = status.remaining,
                threshold = self.rate_limit_threshold,
                reset = %status.reset_time,
                "rate limit below threshold, aborting scan"
            );
            return Err(ScanError::RateLimitExceeded {
                remaining: status.remaining,
                threshold: self.rate_limit_threshold,
                reset_time: status.reset_time,
            });
        }

        Ok(())
    }

    async fn read_file(&self, repo: &RepositoryLocator, entry: &Entry) -> FileOutcome {
        match self
            .provider
            .fetch_content(self.credential, repo, entry, self.git_ref)
            .await
        {
            Ok(bytes) => decode_text(bytes),
            Err(e) => FileOutcome::Skipped(SkipReason::FetchFailed(e)),
        }
    }
}

/// Paths are unique within a tree; a repeat keeps the first content.
fn insert_unique(files: &mut BTreeMap<String, String>, path: String, text: String) {
    match files.entry(path) {
        MapEntry::Vacant(slot) => {
            slot.insert(text);
        }
        MapEntry::Occupied(slot) => {
            warn!(path = %slot.key(), "provider returned the same path twice, keeping the first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Listing, RateLimitInfo};
    use crate::provider::MemoryProvider;
    use async_trait::async_trait;
    use chrono::Utc;

    const NO_FILTER: Option<&[&str]> = None;

    fn credential() -> Credential {
        Credential::new("token")
    }

    fn sample_tree() -> MemoryProvider {
        MemoryProvider::new("owner", "repo")
            .with_file("a.py", "x")
            .with_file("node_modules/b.js", "y")
            .with_file("docs/c.md", "z")
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(
            decode_text(b"print(1)".to_vec()),
            FileOutcome::Text("print(1)".to_string())
        );
        assert_eq!(
            decode_text(vec![0x89, 0x50, 0x4e, 0x47, 0xff]),
            FileOutcome::Skipped(SkipReason::NotUtf8)
        );
    }

    #[tokio::test]
    async fn test_sample_tree_without_filter() {
        let provider = sample_tree();
        let cred = credential();
        let result = TreeWalker::new(&provider, &cred)
            .scan("https://example.com/owner/repo", NO_FILTER)
            .await
            .unwrap();
        assert_eq!(result.files, map(&[("a.py", "x")]));
        assert_eq!(result.repository.owner, "owner");
        assert_eq!(result.repository.locator, "https://example.com/owner/repo");
    }

    #[tokio::test]
    async fn test_sample_tree_with_filter_still_excludes_node_modules() {
        let provider = sample_tree();
        let cred = credential();
        let result = TreeWalker::new(&provider, &cred)
            .scan("owner/repo", Some(&["py", "js"][..]))
            .await
            .unwrap();
        assert_eq!(result.files, map(&[("a.py", "x")]));
    }

    #[tokio::test]
    async fn test_deep_tree_fully_visited() {
        let provider = MemoryProvider::new("o", "r")
            .with_file("src/flask/json/provider.py", "p")
            .with_file("src/flask/app.py", "a")
            .with_file("src/flask/templates/index.html", "<p>")
            .with_file("setup.py", "s");
        let cred = credential();
        let files = TreeWalker::new(&provider, &cred)
            .walk(&RepositoryLocator::new("o", "r"), None)
            .await
            .unwrap();
        assert_eq!(
            files,
            map(&[
                ("setup.py", "s"),
                ("src/flask/app.py", "a"),
                ("src/flask/json/provider.py", "p"),
                ("src/flask/templates/index.html", "<p>"),
            ])
        );
        // root, src, src/flask, src/flask/json, src/flask/templates
        assert_eq!(provider.list_calls(), 5);
    }

    #[tokio::test]
    async fn test_binary_and_unreadable_files_skipped() {
        let provider = MemoryProvider::new("o", "r")
            .with_file("ok.rs", "fn main() {}")
            .with_bytes("blob.c", vec![0xff, 0xfe, 0x00])
            .with_file("gone.go", "package main")
            .with_failure(
                "gone.go",
                ProviderError::Api {
                    status: Some(500),
                    message: "boom".to_string(),
                },
            );
        let cred = credential();
        let files = TreeWalker::new(&provider, &cred)
            .walk(&RepositoryLocator::new("o", "r"), None)
            .await
            .unwrap();
        assert_eq!(files, map(&[("ok.rs", "fn main() {}")]));
    }

    #[tokio::test]
    async fn test_filtered_files_never_fetched() {
        let provider = sample_tree().with_file("logo.png", "not really");
        let cred = credential();
        TreeWalker::new(&provider, &cred)
            .walk(&RepositoryLocator::new("owner", "repo"), None)
            .await
            .unwrap();
        assert_eq!(provider.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_symlinks_ignored() {
        let provider = MemoryProvider::new("o", "r")
            .with_file("a.py", "x")
            .with_symlink("alias.py");
        let cred = credential();
        let files = TreeWalker::new(&provider, &cred)
            .walk(&RepositoryLocator::new("o", "r"), None)
            .await
            .unwrap();
        assert_eq!(files, map(&[("a.py", "x")]));
    }

    #[tokio::test]
    async fn test_empty_filter_yields_nothing() {
        let provider = sample_tree();
        let cred = credential();
        let empty: &[&str] = &[];
        let result = TreeWalker::new(&provider, &cred)
            .scan("owner/repo", Some(empty))
            .await
            .unwrap();
        assert!(result.files.is_empty());
        assert_eq!(provider.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_any_request() {
        let provider = sample_tree();
        let cred = credential();
        let walker = TreeWalker::new(&provider, &cred);

        assert!(matches!(
            walker.scan("one-segment", NO_FILTER).await,
            Err(ScanError::InvalidLocator { .. })
        ));
        assert!(matches!(
            walker.scan("owner/repo", Some(&["exe"][..])).await,
            Err(ScanError::InvalidFilter { .. })
        ));
        assert_eq!(provider.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_repository_and_ref() {
        let provider = sample_tree();
        let cred = credential();

        let err = TreeWalker::new(&provider, &cred)
            .scan("owner/other", NO_FILTER)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::RepositoryNotFound {
                owner: "owner".to_string(),
                name: "other".to_string()
            }
        );

        let err = TreeWalker::new(&provider, &cred)
            .with_ref(Some("nonexistent-branch"))
            .scan("owner/repo", NO_FILTER)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::RepositoryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ref_recorded_in_result() {
        let provider = sample_tree().with_ref("stable");
        let cred = credential();
        let result = TreeWalker::new(&provider, &cred)
            .with_ref(Some("stable"))
            .scan("owner/repo", NO_FILTER)
            .await
            .unwrap();
        assert_eq!(result.git_ref.as_deref(), Some("stable"));
    }

    #[tokio::test]
    async fn test_bad_credential() {
        let provider = sample_tree().with_token("right");
        let cred = Credential::new("wrong");
        let err = TreeWalker::new(&provider, &cred)
            .scan("owner/repo", NO_FILTER)
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_walk() {
        let provider = sample_tree().with_failure(
            "docs",
            ProviderError::Transport("connection reset".to_string()),
        );
        let cred = credential();
        let err = TreeWalker::new(&provider, &cred)
            .scan("owner/repo", NO_FILTER)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::RemoteService {
                message: "connection reset".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rate_limit_threshold() {
        let provider = sample_tree().with_rate_limit(5, 5000);
        let cred = credential();

        let err = TreeWalker::new(&provider, &cred)
            .with_rate_limit_threshold(10)
            .scan("owner/repo", NO_FILTER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::RateLimitExceeded {
                remaining: 5,
                threshold: 10,
                ..
            }
        ));
        assert_eq!(provider.list_calls(), 0);

        let ok = TreeWalker::new(&provider, &cred)
            .with_rate_limit_threshold(5)
            .scan("owner/repo", NO_FILTER)
            .await;
        assert!(ok.is_ok());
    }

    /// Lists the same file twice at the root.
    struct DuplicatingProvider;

    #[async_trait]
    impl ContentProvider for DuplicatingProvider {
        fn name(&self) -> &'static str {
            "duplicating"
        }

        async fn list_contents(
            &self,
            _credential: &Credential,
            _repo: &RepositoryLocator,
            _path: &str,
            _git_ref: Option<&str>,
        ) -> Result<Listing, ProviderError> {
            Ok(Listing::Directory(vec![Entry::file("a.py"), Entry::file("a.py")]))
        }

        async fn fetch_content(
            &self,
            _credential: &Credential,
            _repo: &RepositoryLocator,
            _entry: &Entry,
            _git_ref: Option<&str>,
        ) -> Result<Vec<u8>, ProviderError> {
            Ok(b"x".to_vec())
        }

        async fn rate_limit(&self, _credential: &Credential) -> Result<RateLimitInfo, ProviderError> {
            Ok(RateLimitInfo {
                remaining: 100,
                limit: 100,
                reset_time: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_duplicate_paths_keep_single_entry() {
        let cred = credential();
        let files = TreeWalker::new(&DuplicatingProvider, &cred)
            .walk(&RepositoryLocator::new("o", "r"), None)
            .await
            .unwrap();
        assert_eq!(files, map(&[("a.py", "x")]));
    }
}
