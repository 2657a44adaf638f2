//! Batch rename strategies over ordered collections of directories.
//!
//! A batch is applied element by element. Each target name is validated
//! and committed before the next element is considered, and the entity is
//! pointed at its new location as soon as the rename succeeds. A failure
//! stops the batch; directories renamed before it stay renamed.

use std::path::PathBuf;

use regex::Regex;
use rusty_dirmanager_common::{
    ProgressCallback, ThreadRngTokens, TokenGenerator, DEFAULT_SEPARATOR, DEFAULT_START_FROM,
};
use serde::{Deserialize, Serialize};

use crate::entity::DirectoryEntity;
use crate::error::FileSystemError;
use crate::naming::{validate_folder_name, validate_separator};
use crate::provider::DirectoryProvider;
use crate::search::compile_regex;

/// Naming strategy applied to every directory of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenameStrategy {
    /// `AddIncrementalNumbersToBeginning` with separator `-` starting at 1,
    /// whatever the options say.
    #[default]
    Default,
    /// Rename the single element of the batch to `target_name`.
    UseUniqueName,
    /// Prepend `{counter}{separator}`.
    AddIncrementalNumbersToBeginning,
    /// Append `{separator}{counter}`.
    AddIncrementalNumbersToEnd,
    /// Append `{separator}` and four random uppercase letters.
    AddRandomLettersToEnd,
    /// Replace the name with a random `xxxxxxxx.xxx` token.
    GenerateRandomName,
    /// Strip every match of `pattern`.
    RemoveMatchedRegexPattern,
    /// Substitute every match of `pattern` with `replacement`.
    ReplaceMatchedRegexPattern,
}

/// Parameters for the rename strategies. Each strategy reads only the
/// fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    /// Separator between the name and a generated token. `None` joins them directly.
    pub separator: Option<char>,

    /// First counter value for the incremental strategies.
    pub start_from: i64,

    /// Regular expression for the regex strategies.
    pub pattern: String,

    /// Replacement text for `ReplaceMatchedRegexPattern`. Supports `$1` and `${name}`.
    pub replacement: String,

    /// Exact name for `UseUniqueName`.
    pub target_name: String,

    /// Whether regex matching ignores case.
    pub case_insensitive: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            separator: Some(DEFAULT_SEPARATOR),
            start_from: DEFAULT_START_FROM,
            pattern: String::new(),
            replacement: String::new(),
            target_name: String::new(),
            case_insensitive: true,
        }
    }
}

impl RenameOptions {
    /// Set the separator. `None` means no separator.
    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    /// Set the first counter value.
    pub fn with_start_from(mut self, start_from: i64) -> Self {
        self.start_from = start_from;
        self
    }

    /// Set the regex pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the regex replacement.
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    /// Set the exact name for `UseUniqueName`.
    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = target_name.into();
        self
    }

    /// Set whether regex matching ignores case.
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }
}

/// Progress reported after each element of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameProgress {
    /// Zero-based position in the batch.
    pub index: usize,
    /// Number of elements in the batch.
    pub total: usize,
    /// Path before the rename.
    pub old_path: PathBuf,
    /// Path after the rename, or `None` if the element was left unchanged.
    pub new_path: Option<PathBuf>,
}

/// Outcome of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// Directories that were renamed.
    pub renamed: usize,
    /// Directories whose name was already the target.
    pub skipped: usize,
}

static THREAD_RNG_TOKENS: ThreadRngTokens = ThreadRngTokens;

/// Applies rename strategies through a `DirectoryProvider`.
pub struct RenameEngine<'a> {
    provider: &'a dyn DirectoryProvider,
    tokens: &'a dyn TokenGenerator,
    progress: Option<&'a dyn ProgressCallback<RenameProgress>>,
}

impl<'a> RenameEngine<'a> {
    /// Create an engine using the thread-local RNG for random tokens.
    pub fn new(provider: &'a dyn DirectoryProvider) -> Self {
        Self {
            provider,
            tokens: &THREAD_RNG_TOKENS,
            progress: None,
        }
    }

    /// Use a specific token generator.
    pub fn with_tokens(mut self, tokens: &'a dyn TokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }

    /// Report each element to `progress`. Returning `false` cancels the batch.
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback<RenameProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Rename a batch using the strategy selected by tag.
    ///
    /// # Arguments
    /// * `directories` - Batch to rename; entities are updated in place
    /// * `strategy` - Strategy to apply
    /// * `options` - Strategy parameters
    ///
    /// # Errors
    /// See the per-strategy methods. `Cancelled` if the progress callback
    /// asks to stop.
    pub fn rename_all(
        &self,
        directories: &mut [DirectoryEntity],
        strategy: RenameStrategy,
        options: &RenameOptions,
    ) -> Result<RenameReport, FileSystemError> {
        match strategy {
            RenameStrategy::Default => self.add_incremental_numbers_to_beginning(
                directories,
                Some(DEFAULT_SEPARATOR),
                DEFAULT_START_FROM,
            ),
            RenameStrategy::UseUniqueName => {
                self.use_unique_name(directories, &options.target_name)
            }
            RenameStrategy::AddIncrementalNumbersToBeginning => self
                .add_incremental_numbers_to_beginning(
                    directories,
                    options.separator,
                    options.start_from,
                ),
            RenameStrategy::AddIncrementalNumbersToEnd => self.add_incremental_numbers_to_end(
                directories,
                options.separator,
                options.start_from,
            ),
            RenameStrategy::AddRandomLettersToEnd => {
                self.add_random_letters_to_end(directories, options.separator)
            }
            RenameStrategy::GenerateRandomName => self.generate_random_name(directories),
            RenameStrategy::RemoveMatchedRegexPattern => self.remove_matched_regex_pattern(
                directories,
                &options.pattern,
                options.case_insensitive,
            ),
            RenameStrategy::ReplaceMatchedRegexPattern => self.replace_matched_regex_pattern(
                directories,
                &options.pattern,
                &options.replacement,
                options.case_insensitive,
            ),
        }
    }

    /// Rename the single element of a batch to an exact name.
    ///
    /// # Errors
    /// Returns `InvalidArgument` unless the batch has exactly one element
    /// and `name` is not blank, or `InvalidName` for reserved characters.
    pub fn use_unique_name(
        &self,
        directories: &mut [DirectoryEntity],
        name: &str,
    ) -> Result<RenameReport, FileSystemError> {
        if directories.len() != 1 {
            return Err(FileSystemError::invalid_argument(format!(
                "a unique name can only be given to exactly one directory, got {}",
                directories.len()
            )));
        }
        validate_folder_name(name)?;
        self.apply(directories, |_, _| Ok(Some(name.to_string())))
    }

    /// Prepend `{counter}{separator}` to every name.
    ///
    /// # Errors
    /// Returns `InvalidSeparator` before any rename if the separator is rejected.
    pub fn add_incremental_numbers_to_beginning(
        &self,
        directories: &mut [DirectoryEntity],
        separator: Option<char>,
        start_from: i64,
    ) -> Result<RenameReport, FileSystemError> {
        validate_separator(separator)?;
        let sep: String = separator_text(separator);
        self.apply(directories, |index, entity| {
            let counter: i64 = counter_at(start_from, index)?;
            Ok(Some(format!("{}{}{}", counter, sep, entity.name())))
        })
    }

    /// Append `{separator}{counter}` to every name.
    ///
    /// # Errors
    /// Returns `InvalidSeparator` before any rename if the separator is rejected.
    pub fn add_incremental_numbers_to_end(
        &self,
        directories: &mut [DirectoryEntity],
        separator: Option<char>,
        start_from: i64,
    ) -> Result<RenameReport, FileSystemError> {
        validate_separator(separator)?;
        let sep: String = separator_text(separator);
        self.apply(directories, |index, entity| {
            let counter: i64 = counter_at(start_from, index)?;
            Ok(Some(format!("{}{}{}", entity.name(), sep, counter)))
        })
    }

    /// Append `{separator}` and a random uppercase token to every name.
    ///
    /// # Errors
    /// Returns `InvalidSeparator` before any rename if the separator is rejected.
    pub fn add_random_letters_to_end(
        &self,
        directories: &mut [DirectoryEntity],
        separator: Option<char>,
    ) -> Result<RenameReport, FileSystemError> {
        validate_separator(separator)?;
        let sep: String = separator_text(separator);
        self.apply(directories, |_, entity| {
            Ok(Some(format!(
                "{}{}{}",
                entity.name(),
                sep,
                self.tokens.random_letters()
            )))
        })
    }

    /// Replace every name with a random token.
    pub fn generate_random_name(
        &self,
        directories: &mut [DirectoryEntity],
    ) -> Result<RenameReport, FileSystemError> {
        self.apply(directories, |_, _| Ok(Some(self.tokens.random_folder_name())))
    }

    /// Strip every match of `pattern` from every name. Names without a
    /// match are left alone.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a blank pattern or `InvalidPattern` for
    /// one that does not compile, both before any rename.
    pub fn remove_matched_regex_pattern(
        &self,
        directories: &mut [DirectoryEntity],
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<RenameReport, FileSystemError> {
        self.replace_matched_regex_pattern(directories, pattern, "", case_insensitive)
    }

    /// Substitute every match of `pattern` with `replacement`. Names without
    /// a match are left alone.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a blank pattern or `InvalidPattern` for
    /// one that does not compile, both before any rename.
    pub fn replace_matched_regex_pattern(
        &self,
        directories: &mut [DirectoryEntity],
        pattern: &str,
        replacement: &str,
        case_insensitive: bool,
    ) -> Result<RenameReport, FileSystemError> {
        if pattern.trim().is_empty() {
            return Err(FileSystemError::invalid_argument(
                "regex pattern cannot be empty or blank",
            ));
        }
        let regex: Regex = compile_regex(pattern, case_insensitive)?;
        self.apply(directories, |_, entity| {
            Ok(Some(regex.replace_all(entity.name(), replacement).into_owned()))
        })
    }

    /// Rename each element to the name chosen by `target_for`, in order.
    fn apply<F>(
        &self,
        directories: &mut [DirectoryEntity],
        mut target_for: F,
    ) -> Result<RenameReport, FileSystemError>
    where
        F: FnMut(usize, &DirectoryEntity) -> Result<Option<String>, FileSystemError>,
    {
        let total: usize = directories.len();
        let mut report: RenameReport = RenameReport::default();

        for (index, entity) in directories.iter_mut().enumerate() {
            let old_path: PathBuf = entity.full_path().to_path_buf();

            let new_path: Option<PathBuf> = match target_for(index, entity)? {
                Some(name) if name != entity.name() => {
                    validate_folder_name(&name)?;
                    let renamed: PathBuf = self.provider.rename_in_place(entity, &name)?;
                    entity.relocate(renamed.clone())?;
                    log::debug!("Renamed {} to {}", old_path.display(), renamed.display());
                    report.renamed += 1;
                    Some(renamed)
                }
                _ => {
                    log::trace!("Name of {} unchanged, skipping", old_path.display());
                    report.skipped += 1;
                    None
                }
            };

            if let Some(progress) = self.progress {
                let update: RenameProgress = RenameProgress {
                    index,
                    total,
                    old_path,
                    new_path,
                };
                if !progress.on_progress(&update) {
                    return Err(FileSystemError::Cancelled);
                }
            }
        }

        Ok(report)
    }
}

fn separator_text(separator: Option<char>) -> String {
    separator.map(String::from).unwrap_or_default()
}

fn counter_at(start_from: i64, index: usize) -> Result<i64, FileSystemError> {
    i64::try_from(index)
        .ok()
        .and_then(|offset| start_from.checked_add(offset))
        .ok_or_else(|| FileSystemError::invalid_argument("rename counter overflowed"))
}
