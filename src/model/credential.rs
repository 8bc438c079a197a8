/// An access token passed through to the content provider.
///
/// The secret never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `***` followed by the last four characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("***{}", tail)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_shows_last_four() {
        let credential = Credential::new("ghp_abcdefgh1234");
        assert_eq!(credential.masked(), "***1234");
        assert_eq!(credential.to_string(), "***1234");
        assert!(!format!("{:?}", credential).contains("abcdefgh"));
    }

    #[test]
    fn test_masked_short_token() {
        assert_eq!(Credential::new("ab").masked(), "***ab");
        assert_eq!(Credential::new("").masked(), "***");
    }

    #[test]
    fn test_expose_returns_secret() {
        let credential: Credential = "ghp_secret".into();
        assert_eq!(credential.expose(), "ghp_secret");
    }
}
