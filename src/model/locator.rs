use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ScanError;

/// Host prefixes stripped from scheme-less locators.
const KNOWN_HOSTS: &[&str] = &["www.github.com/", "github.com/"];

/// Owner and repository name, e.g. `pallets/click`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryLocator {
    pub owner: String,
    pub name: String,
}

impl RepositoryLocator {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses a repository URL or `owner/name` shorthand.
    ///
    /// Accepted forms include:
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo.git`
    /// - `github.com/owner/repo/tree/main/src` (extra segments are ignored)
    /// - `owner/repo`
    ///
    /// When a scheme is present the first segment is taken to be the host,
    /// whatever it is.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidLocator`] if fewer than two non-empty
    /// segments remain.
    pub fn parse(input: &str) -> Result<Self, ScanError> {
        let invalid = || ScanError::InvalidLocator {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        let (rest, had_scheme) = match trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
        {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let rest = if had_scheme {
            match rest.split_once('/') {
                Some((_host, path)) => path,
                None => "",
            }
        } else {
            KNOWN_HOSTS
                .iter()
                .find_map(|host| rest.strip_prefix(host))
                .unwrap_or(rest)
        };

        let rest = rest.trim_end_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        let rest = rest.trim_end_matches('/');

        let mut parts = rest.split('/');
        let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryLocator {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for RepositoryLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> (String, String) {
        let locator = RepositoryLocator::parse(input).unwrap();
        (locator.owner, locator.name)
    }

    fn pair(owner: &str, name: &str) -> (String, String) {
        (owner.to_string(), name.to_string())
    }

    #[test]
    fn test_parse_https_url() {
        assert_eq!(parse("https://github.com/pallets/click"), pair("pallets", "click"));
        assert_eq!(parse("https://example.com/owner/repo"), pair("owner", "repo"));
    }

    #[test]
    fn test_parse_strips_git_suffix() {
        assert_eq!(parse("https://example.com/owner/repo.git"), pair("owner", "repo"));
        assert_eq!(parse("https://github.com/user/repo.git/"), pair("user", "repo"));
    }

    #[test]
    fn test_parse_http_and_trailing_slash() {
        assert_eq!(parse("http://github.com/owner/repo/"), pair("owner", "repo"));
    }

    #[test]
    fn test_parse_shorthand_ignores_extra_segments() {
        assert_eq!(parse("owner/repo/extra/segments"), pair("owner", "repo"));
        assert_eq!(
            parse("https://github.com/pallets/flask/blob/main/src/flask/app.py"),
            pair("pallets", "flask")
        );
    }

    #[test]
    fn test_parse_known_host_without_scheme() {
        assert_eq!(parse("github.com/rust-lang/rust"), pair("rust-lang", "rust"));
        assert_eq!(parse("www.github.com/rust-lang/rust"), pair("rust-lang", "rust"));
    }

    #[test]
    fn test_parse_rejects_single_segment() {
        assert!(matches!(
            RepositoryLocator::parse("just-one-segment"),
            Err(ScanError::InvalidLocator { .. })
        ));
        assert!(RepositoryLocator::parse("https://github.com/only-owner").is_err());
        assert!(RepositoryLocator::parse("not-a-url").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(RepositoryLocator::parse("/").is_err());
        assert!(RepositoryLocator::parse("").is_err());
        assert!(RepositoryLocator::parse("//repo").is_err());
        assert!(RepositoryLocator::parse("https://github.com/").is_err());
        assert!(RepositoryLocator::parse("owner/.git").is_err());
    }

    #[test]
    fn test_invalid_locator_keeps_input() {
        match RepositoryLocator::parse("nope") {
            Err(ScanError::InvalidLocator { input }) => assert_eq!(input, "nope"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_from_str_and_display() {
        let locator: RepositoryLocator = "octocat/Hello-World".parse().unwrap();
        assert_eq!(locator.to_string(), "octocat/Hello-World");
        assert_eq!(locator.full_name(), "octocat/Hello-World");
    }
}
