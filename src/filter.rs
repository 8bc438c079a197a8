//! Path filtering.
//!
//! Decides which repository paths are worth fetching: a path is scanned when
//! it lies outside every excluded directory and ends with a recognized
//! source-file extension.

use crate::error::ScanError;

/// Recognized source-file suffixes, dot included.
const EXTENSION_SET: &[&str] = &[
    // Python
    ".py",
    // JavaScript/TypeScript
    ".js", ".jsx", ".ts", ".tsx",
    // Web
    ".html", ".htm", ".css", ".scss", ".sass", ".vue", ".svelte",
    // Java
    ".java",
    // C/C++
    ".c", ".cpp", ".h", ".hpp", ".cc",
    // Other languages
    ".go", ".rs", ".rb", ".php", ".swift", ".kt", ".cs",
];

/// Path substrings that disqualify a file regardless of its extension.
const EXCLUDED_DIRECTORIES: &[&str] = &[
    "node_modules/",
    ".git/",
    "venv/",
    "env/",
    ".venv/",
    "__pycache__/",
    "dist/",
    "build/",
    ".next/",
    ".nuxt/",
    "target/",
    "bin/",
    "obj/",
    "test/",
    "tests/",
    ".pytest_cache/",
    "coverage/",
];

pub fn recognized_extensions() -> &'static [&'static str] {
    EXTENSION_SET
}

pub fn excluded_directories() -> &'static [&'static str] {
    EXCLUDED_DIRECTORIES
}

/// A validated subset of the recognized extensions.
///
/// An empty filter matches nothing, which is different from having no
/// filter at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Normalizes each entry to a leading-dot form and checks it against
    /// the recognized set.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidFilter`] for the first entry that is not
    /// recognized.
    pub fn new<I, S>(extensions: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if !EXTENSION_SET.contains(&ext.as_str()) {
                return Err(ScanError::InvalidFilter { extension: ext });
            }
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Ok(Self {
            extensions: normalized,
        })
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn matches(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_DIRECTORIES.iter().any(|dir| path.contains(dir))
}

/// Checks a path against an already-validated filter.
///
/// `None` allows the whole recognized set.
pub fn is_scannable(path: &str, filter: Option<&ExtensionFilter>) -> bool {
    if is_excluded(path) {
        return false;
    }

    match filter {
        Some(filter) => filter.matches(path),
        None => EXTENSION_SET.iter().any(|ext| path.ends_with(ext)),
    }
}

/// Decides whether `path` should be fetched, validating `extension_filter`
/// first.
///
/// # Errors
///
/// Returns [`ScanError::InvalidFilter`] when any filter entry is not a
/// recognized extension, before the path is looked at.
///
/// # Example
///
/// ```
/// use reposnap::filter::should_scan;
///
/// assert!(should_scan("src/main.py", None::<&[&str]>).unwrap());
/// assert!(should_scan("main.py", Some(&["py"][..])).unwrap());
/// assert!(!should_scan("node_modules/x.js", None::<&[&str]>).unwrap());
/// assert!(should_scan("file.py", Some(&["invalid"][..])).is_err());
/// ```
pub fn should_scan<S: AsRef<str>>(
    path: &str,
    extension_filter: Option<&[S]>,
) -> Result<bool, ScanError> {
    let filter = extension_filter.map(ExtensionFilter::new).transpose()?;
    Ok(is_scannable(path, filter.as_ref()))
}
