//! Core data types for repositories, provider entries, and scan results.
//!
//! - [`Credential`] - An access token with masked formatting
//! - [`RepositoryLocator`] - An owner/name pair identifying a repository
//! - [`Entry`] / [`Listing`] - Nodes returned by a content provider
//! - [`RateLimitInfo`] - Remaining request quota
//! - [`RepoInfo`] - What the last successful scan targeted
//! - [`ScanResult`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use reposnap::model::{RepoInfo, RepositoryLocator, ScanResult};
//! use std::collections::BTreeMap;
//!
//! let locator = RepositoryLocator::parse("pallets/click").unwrap();
//! let repo = RepoInfo::new(&locator, "pallets/click");
//! let result = ScanResult::new(repo, None, BTreeMap::new());
//!
//! println!("Scanned {} files", result.files.len());
//! ```

mod credential;
mod locator;

pub use credential::*;
pub use locator::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else the walker does not follow.
    Other,
}

impl EntryKind {
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        }
    }
}

/// A single node returned by a content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Full repository-relative path.
    pub path: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Where the raw bytes can be fetched without going through the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl Entry {
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            size: None,
            download_url: None,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::File)
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Dir)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }
}

/// What a provider returns for one path: the children of a directory, or
/// the single entry when the path names a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Directory(Vec<Entry>),
    File(Entry),
}

impl Listing {
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            Listing::Directory(entries) => entries,
            Listing::File(entry) => vec![entry],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub remaining: u64,
    pub limit: u64,
    pub reset_time: DateTime<Utc>,
}

/// The repository a successful scan targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    /// The locator string exactly as the caller supplied it.
    pub locator: String,
}

impl RepoInfo {
    pub fn new(locator: &RepositoryLocator, input: impl Into<String>) -> Self {
        Self {
            owner: locator.owner.clone(),
            name: locator.name.clone(),
            locator: input.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub repository: RepoInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Repository-relative path to decoded UTF-8 content.
    pub files: BTreeMap<String, String>,
    pub scan_time: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(
        repository: RepoInfo,
        git_ref: Option<String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            repository,
            git_ref,
            files,
            scan_time: Utc::now(),
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|content| content.len()).sum()
    }
}
