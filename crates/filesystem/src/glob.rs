//! Glob matching against directory names.
//!
//! Patterns are matched against a child's leaf name, ignoring case, the
//! way host directory enumeration treats a search pattern. Standard glob
//! syntax applies:
//! - `*` and `?` wildcards
//! - Brace alternatives like `{raw,final}*`
//! - Character classes like `[0-9]`
//!
//! ## Literal Name Matching
//!
//! Folder names may legally contain `[`, `]`, `{`, `}` and `!`. To match
//! such a name literally, escape it with `escape_glob()`:
//!
//! ```
//! use rusty_dirmanager_filesystem::glob::{escape_glob, GlobFilter};
//!
//! let pattern = format!("{}*", escape_glob("take[1]"));
//! let filter = GlobFilter::include(vec![pattern]).unwrap();
//!
//! assert!(filter.matches("take[1]-final"));
//! assert!(!filter.matches("take1-final"));
//! ```

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::FileSystemError;

/// Escape special glob characters in a string to treat it as a literal name.
///
/// # Arguments
/// * `s` - String to escape
///
/// # Returns
/// A new string with all glob metacharacters escaped with backslashes.
///
/// # Example
/// ```
/// use rusty_dirmanager_filesystem::glob::escape_glob;
///
/// assert_eq!(escape_glob("shot[1]"), r"shot\[1\]");
/// assert_eq!(escape_glob("a*b"), r"a\*b");
/// ```
pub fn escape_glob(s: &str) -> String {
    let mut escaped: String = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '*' | '?' | '[' | ']' | '{' | '}' | '!' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Case-insensitive include/exclude filter over directory names.
#[derive(Debug, Clone, Default)]
pub struct GlobFilter {
    /// Patterns for names to include (empty = include all).
    include: Vec<String>,
    /// Patterns for names to exclude.
    exclude: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
}

impl GlobFilter {
    /// Create a filter with no patterns (matches every name).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter from a single search pattern.
    ///
    /// An empty pattern matches every name.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, FileSystemError> {
        if pattern.is_empty() {
            return Ok(Self::new());
        }
        Self::include(vec![pattern.to_string()])
    }

    /// Create a filter with include patterns only.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if any pattern does not compile.
    pub fn include(patterns: Vec<String>) -> Result<Self, FileSystemError> {
        Self::with_patterns(patterns, vec![])
    }

    /// Create a filter with exclude patterns only.
    ///
    /// # Errors
    /// Returns `InvalidPattern` if any pattern does not compile.
    pub fn exclude(patterns: Vec<String>) -> Result<Self, FileSystemError> {
        Self::with_patterns(vec![], patterns)
    }

    /// Create a filter with both include and exclude patterns.
    ///
    /// # Arguments
    /// * `include` - Patterns for names to include
    /// * `exclude` - Patterns for names to exclude
    ///
    /// # Errors
    /// Returns `InvalidPattern` if any pattern does not compile.
    pub fn with_patterns(
        include: Vec<String>,
        exclude: Vec<String>,
    ) -> Result<Self, FileSystemError> {
        let include_set: Option<GlobSet> = compile_set(&include)?;
        let exclude_set: Option<GlobSet> = compile_set(&exclude)?;
        Ok(Self {
            include,
            exclude,
            include_set,
            exclude_set,
        })
    }

    /// Check whether a directory name passes the filter.
    ///
    /// # Arguments
    /// * `name` - Leaf name of a directory
    pub fn matches(&self, name: &str) -> bool {
        let included: bool = match &self.include_set {
            Some(set) => set.is_match(name),
            None => true,
        };

        let excluded: bool = match &self.exclude_set {
            Some(set) => set.is_match(name),
            None => false,
        };

        included && !excluded
    }

    /// Check if the filter has any patterns.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Get the include patterns.
    pub fn include_patterns(&self) -> &[String] {
        &self.include
    }

    /// Get the exclude patterns.
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }
}

fn compile_set(patterns: &[String]) -> Result<Option<GlobSet>, FileSystemError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder: GlobSetBuilder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| FileSystemError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }

    let set: GlobSet = builder
        .build()
        .map_err(|e| FileSystemError::InvalidPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;
    Ok(Some(set))
}
