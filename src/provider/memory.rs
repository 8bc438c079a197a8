use crate::model::{Credential, Entry, EntryKind, Listing, RateLimitInfo, RepositoryLocator};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::ProviderError;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Symlink,
}

/// A content provider backed by an in-memory file tree.
///
/// Directories are implied by file paths. Only the configured repository
/// exists; any other owner/name is reported as not found.
pub struct MemoryProvider {
    repo: RepositoryLocator,
    nodes: BTreeMap<String, Node>,
    token: Option<String>,
    refs: Vec<String>,
    failures: BTreeMap<String, ProviderError>,
    remaining: AtomicU64,
    limit: u64,
    reset_time: DateTime<Utc>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: RepositoryLocator::new(owner, name),
            nodes: BTreeMap::new(),
            token: None,
            refs: vec!["main".to_string()],
            failures: BTreeMap::new(),
            remaining: AtomicU64::new(5000),
            limit: 5000,
            reset_time: DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default(),
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.nodes
            .insert(path.into(), Node::File(content.into().into_bytes()));
        self
    }

    pub fn with_bytes(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.nodes.insert(path.into(), Node::File(bytes));
        self
    }

    pub fn with_symlink(mut self, path: impl Into<String>) -> Self {
        self.nodes.insert(path.into(), Node::Symlink);
        self
    }

    /// Only this token is accepted; without it any credential is.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds a ref besides `main` that can be passed as `git_ref`.
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.refs.push(git_ref.into());
        self
    }

    /// Makes every request touching `path` fail with `error`.
    pub fn with_failure(mut self, path: impl Into<String>, error: ProviderError) -> Self {
        self.failures.insert(path.into(), error);
        self
    }

    pub fn with_rate_limit(mut self, remaining: u64, limit: u64) -> Self {
        self.remaining = AtomicU64::new(remaining);
        self.limit = limit;
        self
    }

    pub fn set_remaining(&self, remaining: u64) {
        self.remaining.store(remaining, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn authorize(&self, credential: &Credential) -> Result<(), ProviderError> {
        match &self.token {
            Some(token) if token != credential.expose() => Err(ProviderError::BadCredentials),
            _ => Ok(()),
        }
    }

    fn resolve(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.authorize(credential)?;

        let known_ref = git_ref.map_or(true, |r| self.refs.iter().any(|known| known == r));
        if repo != &self.repo || !known_ref {
            return Err(ProviderError::NotFound {
                path: path.to_string(),
            });
        }

        match self.failures.get(path) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn entry_for(path: &str, node: &Node) -> Entry {
        match node {
            Node::File(bytes) => Entry::file(path).with_size(bytes.len() as u64),
            Node::Symlink => Entry::new(path, EntryKind::Other),
        }
    }

    fn children(&self, dir: &str) -> Option<Vec<Entry>> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for (path, node) in self.nodes.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    dirs.insert(format!("{}{}", prefix, child));
                }
                None => entries.push(Self::entry_for(path, node)),
            }
        }

        if dir.is_empty() || !dirs.is_empty() || !entries.is_empty() {
            entries.extend(dirs.into_iter().map(Entry::dir));
            Some(entries)
        } else {
            None
        }
    }
}

#[async_trait]
impl super::ContentProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "In-memory tree"
    }

    async fn list_contents(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Listing, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.resolve(credential, repo, path, git_ref)?;

        if let Some(node) = self.nodes.get(path) {
            return Ok(Listing::File(Self::entry_for(path, node)));
        }

        self.children(path)
            .map(Listing::Directory)
            .ok_or_else(|| ProviderError::NotFound {
                path: path.to_string(),
            })
    }

    async fn fetch_content(
        &self,
        credential: &Credential,
        repo: &RepositoryLocator,
        entry: &Entry,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.resolve(credential, repo, &entry.path, git_ref)?;

        match self.nodes.get(&entry.path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            _ => Err(ProviderError::NotFound {
                path: entry.path.clone(),
            }),
        }
    }

    async fn rate_limit(&self, credential: &Credential) -> Result<RateLimitInfo, ProviderError> {
        self.authorize(credential)?;
        Ok(RateLimitInfo {
            remaining: self.remaining.load(Ordering::SeqCst),
            limit: self.limit,
            reset_time: self.reset_time,
        })
    }
}
