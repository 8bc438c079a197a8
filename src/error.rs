//! Error taxonomy for scans.
//!
//! Every failure a caller can observe from a [`Session`](crate::Session) or
//! a [`TreeWalker`](crate::walker::TreeWalker) is one of the [`ScanError`]
//! variants. Provider-side failures arrive as
//! [`ProviderError`](crate::provider::ProviderError) and are classified by
//! [`ScanError::from_provider`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::RepositoryLocator;
use crate::provider::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("not authenticated; call authenticate(credential) first")]
    NotAuthenticated,

    #[error("invalid repository locator: {input}")]
    InvalidLocator { input: String },

    #[error("extension '{extension}' is not in the recognized extension set")]
    InvalidFilter { extension: String },

    #[error("invalid credential; check the token and try again")]
    InvalidCredential,

    #[error("repository '{owner}/{name}' not found; check the URL, branch or access permissions")]
    RepositoryNotFound { owner: String, name: String },

    #[error(
        "rate limit too low: {remaining} requests remaining (threshold {threshold}), resets at {reset_time}"
    )]
    RateLimitExceeded {
        remaining: u64,
        threshold: u64,
        reset_time: DateTime<Utc>,
    },

    #[error("remote service error: {message}")]
    RemoteService { message: String },
}

impl ScanError {
    /// Maps a provider failure into the local taxonomy.
    ///
    /// `NotFound` is reported against `locator`, since the provider cannot
    /// tell a missing repository from a missing ref or a private one.
    pub fn from_provider(err: ProviderError, locator: &RepositoryLocator) -> Self {
        match err {
            ProviderError::BadCredentials => ScanError::InvalidCredential,
            ProviderError::NotFound { .. } => ScanError::RepositoryNotFound {
                owner: locator.owner.clone(),
                name: locator.name.clone(),
            },
            ProviderError::Api { message, .. } => ScanError::RemoteService { message },
            ProviderError::Transport(message) => ScanError::RemoteService { message },
        }
    }

    /// Maps a provider failure that has no repository context, such as a
    /// rate-limit query.
    pub fn from_provider_unscoped(err: ProviderError) -> Self {
        match err {
            ProviderError::BadCredentials => ScanError::InvalidCredential,
            ProviderError::NotFound { path } => ScanError::RemoteService {
                message: format!("not found: {}", path),
            },
            ProviderError::Api { message, .. } => ScanError::RemoteService { message },
            ProviderError::Transport(message) => ScanError::RemoteService { message },
        }
    }

    /// True for every error raised by the remote side, including the
    /// rate-limit guard.
    pub fn is_remote_service(&self) -> bool {
        matches!(
            self,
            ScanError::RemoteService { .. } | ScanError::RateLimitExceeded { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ScanError::RateLimitExceeded { .. })
    }
}
