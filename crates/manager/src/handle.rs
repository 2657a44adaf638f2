//! `DirectoryHandle`: one managed directory with its change notifier.
//!
//! The handle wraps a `DirectoryEntity` and composes the filesystem engines
//! (comparison, search, rename), whole-directory transfers and change
//! notification behind one type. Blocking work has `_async` variants that
//! run on tokio's blocking pool.
//!
//! Moving or renaming the directory replaces its notifier: the old watch is
//! released together with its subscribers, and notification has to be
//! enabled again for the new location.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rusty_dirmanager_common::{folder_view_command, normalize_full_path, FolderViewCommand, Platform};
use rusty_dirmanager_filesystem::{
    validate_folder_name, DirectoryEntity, DirectoryProvider, EquivalenceKey, FileSystemError,
    OutputSelector, LOCAL_FILE_SYSTEM, RenameEngine, RenameOptions, RenameReport, RenameStrategy,
    SearchEngine, SearchMode,
};
use rusty_dirmanager_watcher::{
    ChangeEvent, ChangeNotifier, EventStream, SubscriptionId, WatchOptions,
};
use walkdir::WalkDir;

use crate::error::ManagerError;
use crate::options::HandleOptions;
use crate::transfer::{copy_directory, move_directory};

/// A managed directory.
pub struct DirectoryHandle {
    entity: DirectoryEntity,
    watch_options: WatchOptions,
    notifier: ChangeNotifier,
}

impl std::fmt::Debug for DirectoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryHandle")
            .field("entity", &self.entity)
            .field("watch_options", &self.watch_options)
            .field("notification", &self.notifier.state())
            .finish()
    }
}

impl DirectoryHandle {
    /// Open a directory.
    ///
    /// # Arguments
    /// * `path` - Directory path, made absolute and normalized
    /// * `options` - Creation and notification options
    ///
    /// # Errors
    /// Returns `NotFound` if the directory is missing and
    /// `create_if_missing` is false.
    pub fn open(path: impl AsRef<Path>, options: HandleOptions) -> Result<Self, ManagerError> {
        let full_path: PathBuf = normalize_full_path(path.as_ref())?;

        if options.create_if_missing && !full_path.exists() {
            std::fs::create_dir_all(&full_path)
                .map_err(|e| FileSystemError::io(&full_path, e))?;
            tracing::debug!("Created {}", full_path.display());
        }

        let entity: DirectoryEntity = DirectoryEntity::from_path(&full_path)?;
        Ok(Self::with_watch_options(entity, options.watch))
    }

    /// Wrap an existing entity with default notification options.
    pub fn from_entity(entity: DirectoryEntity) -> Self {
        Self::with_watch_options(entity, WatchOptions::default())
    }

    fn with_watch_options(entity: DirectoryEntity, watch_options: WatchOptions) -> Self {
        let notifier: ChangeNotifier = ChangeNotifier::new(entity.full_path(), watch_options);
        Self {
            entity,
            watch_options,
            notifier,
        }
    }

    /// The underlying entity.
    pub fn entity(&self) -> &DirectoryEntity {
        &self.entity
    }

    /// Release the handle, keeping only the entity. Notification stops.
    pub fn into_entity(self) -> DirectoryEntity {
        self.entity
    }

    /// Leaf name of the directory.
    pub fn name(&self) -> &str {
        self.entity.name()
    }

    /// Absolute, normalized path of the directory.
    pub fn full_path(&self) -> &Path {
        self.entity.full_path()
    }

    /// Check whether the directory is still on disk.
    pub fn exists(&self) -> bool {
        self.entity.exists()
    }

    /// Creation time captured when the handle was opened or last relocated.
    pub fn creation_time(&self) -> SystemTime {
        self.entity.creation_time()
    }

    /// The parent directory.
    ///
    /// # Errors
    /// Returns an error for a filesystem root or a missing parent.
    pub fn parent(&self) -> Result<DirectoryHandle, ManagerError> {
        Ok(Self::from_entity(self.entity.parent()?))
    }

    /// The root of the path, such as `/` or `C:\`.
    pub fn root(&self) -> PathBuf {
        self.full_path()
            .ancestors()
            .last()
            .unwrap_or(self.full_path())
            .to_path_buf()
    }

    /// Last modification time, read from disk.
    pub fn last_write_time(&self) -> Result<SystemTime, ManagerError> {
        let metadata: std::fs::Metadata = self.metadata()?;
        Ok(metadata
            .modified()
            .map_err(|e| FileSystemError::io(self.full_path(), e))?)
    }

    /// Last access time, read from disk.
    pub fn last_access_time(&self) -> Result<SystemTime, ManagerError> {
        let metadata: std::fs::Metadata = self.metadata()?;
        Ok(metadata
            .accessed()
            .map_err(|e| FileSystemError::io(self.full_path(), e))?)
    }

    fn metadata(&self) -> Result<std::fs::Metadata, FileSystemError> {
        std::fs::metadata(self.full_path()).map_err(|e| FileSystemError::io(self.full_path(), e))
    }

    /// Total size in bytes of every file below the directory.
    pub fn compute_aggregate_size(&self) -> Result<u64, ManagerError> {
        Ok(self.entity.compute_aggregate_size()?)
    }

    /// Number of immediate subdirectories.
    pub fn subdirectory_count(&self) -> Result<usize, ManagerError> {
        Ok(self.subdirectories()?.len())
    }

    /// Number of files directly inside the directory.
    pub fn file_count(&self) -> Result<usize, ManagerError> {
        let mut count: usize = 0;
        for entry in WalkDir::new(self.full_path()).min_depth(1).max_depth(1) {
            let entry: walkdir::DirEntry = entry.map_err(|e| FileSystemError::IoError {
                path: self.full_path().display().to_string(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Immediate subdirectories, in name order.
    pub fn subdirectories(&self) -> Result<Vec<DirectoryEntity>, ManagerError> {
        Ok(LOCAL_FILE_SYSTEM.list_immediate_subdirectories(self.full_path())?)
    }

    /// Create a child directory.
    ///
    /// # Errors
    /// Returns `InvalidName` or `InvalidArgument` for a rejected name, or an
    /// IO error if the child already exists.
    pub fn create_subdirectory(&self, name: &str) -> Result<DirectoryHandle, ManagerError> {
        validate_folder_name(name)?;
        let path: PathBuf = self.full_path().join(name);
        std::fs::create_dir(&path).map_err(|e| FileSystemError::io(&path, e))?;
        Ok(Self::from_entity(DirectoryEntity::from_path(&path)?))
    }

    /// Delete the directory, consuming the handle.
    ///
    /// # Arguments
    /// * `recursive` - Remove contents too; otherwise the directory must be empty
    pub fn delete(self, recursive: bool) -> Result<(), ManagerError> {
        self.notifier.disable();
        let path: &Path = self.entity.full_path();
        let result: std::io::Result<()> = if recursive {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_dir(path)
        };
        result.map_err(|e| FileSystemError::io(path, e))?;
        tracing::debug!("Deleted {}", path.display());
        Ok(())
    }

    /// Immediate children of this directory selected against `right`.
    ///
    /// # Arguments
    /// * `right` - Directory whose children form the reference set
    /// * `output` - Matching or non-matching children
    /// * `key` - Attribute compared
    pub fn compare(
        &self,
        right: impl AsRef<Path>,
        output: OutputSelector,
        key: EquivalenceKey,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        compare_children(self.full_path(), right.as_ref(), output, key)
    }

    /// Immediate children whose names match `key` under `mode`.
    pub fn search(
        &self,
        key: Option<&str>,
        mode: SearchMode,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        search_children(self.full_path(), key, mode)
    }

    /// Rename the directory within its parent.
    ///
    /// Change notification is reset and must be enabled again.
    pub fn rename(&mut self, new_name: &str) -> Result<(), ManagerError> {
        let mut batch: [DirectoryEntity; 1] = [self.entity.clone()];
        RenameEngine::new(&LOCAL_FILE_SYSTEM).use_unique_name(&mut batch, new_name)?;
        let [renamed] = batch;
        self.relocate(renamed);
        Ok(())
    }

    /// Rename the directory to a random name.
    ///
    /// Change notification is reset and must be enabled again.
    pub fn generate_random_name(&mut self) -> Result<(), ManagerError> {
        let mut batch: [DirectoryEntity; 1] = [self.entity.clone()];
        RenameEngine::new(&LOCAL_FILE_SYSTEM).generate_random_name(&mut batch)?;
        let [renamed] = batch;
        self.relocate(renamed);
        Ok(())
    }

    /// Move the directory into `dest_dir`, which must exist.
    ///
    /// Change notification is reset and must be enabled again.
    pub fn move_to(&mut self, dest_dir: impl AsRef<Path>) -> Result<(), ManagerError> {
        let dest_dir: PathBuf = normalize_full_path(dest_dir.as_ref())?;
        let moved: PathBuf = move_directory(self.full_path(), &dest_dir)?;
        self.relocate(DirectoryEntity::from_path(moved)?);
        Ok(())
    }

    /// Copy the directory into `dest_dir`.
    ///
    /// # Returns
    /// A handle on the copy, with the same notification options.
    pub fn copy_to(
        &self,
        dest_dir: impl AsRef<Path>,
        copy_subdirs: bool,
        overwrite_files: bool,
    ) -> Result<DirectoryHandle, ManagerError> {
        let dest_dir: PathBuf = normalize_full_path(dest_dir.as_ref())?;
        let copied: PathBuf =
            copy_directory(self.full_path(), &dest_dir, copy_subdirs, overwrite_files)?;
        Ok(Self::with_watch_options(
            DirectoryEntity::from_path(copied)?,
            self.watch_options,
        ))
    }

    /// Move the directory onto the current user's desktop.
    ///
    /// Change notification is reset and must be enabled again.
    pub fn move_to_desktop(&mut self) -> Result<(), ManagerError> {
        let desktop: PathBuf = Self::desktop_path()?;
        self.move_to(desktop)
    }

    /// Copy the directory onto the current user's desktop.
    pub fn copy_to_desktop(
        &self,
        copy_subdirs: bool,
        overwrite_files: bool,
    ) -> Result<DirectoryHandle, ManagerError> {
        let desktop: PathBuf = Self::desktop_path()?;
        self.copy_to(desktop, copy_subdirs, overwrite_files)
    }

    /// Reveal the directory in the platform's file browser.
    ///
    /// The browser is started and not waited on.
    pub fn launch_folder_view(&self) -> Result<(), ManagerError> {
        let command: FolderViewCommand = folder_view_command(Platform::current(), self.full_path())?;
        std::process::Command::new(command.program)
            .args(&command.args)
            .spawn()
            .map_err(|source| ManagerError::Launch {
                program: command.program.to_string(),
                source,
            })?;
        tracing::debug!("Launched {} for {}", command.program, self.full_path().display());
        Ok(())
    }

    /// Background variant of `compare`.
    pub async fn compare_async(
        &self,
        right: impl Into<PathBuf>,
        output: OutputSelector,
        key: EquivalenceKey,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let left: PathBuf = self.full_path().to_path_buf();
        let right: PathBuf = right.into();
        tokio::task::spawn_blocking(move || compare_children(&left, &right, output, key)).await?
    }

    /// Background variant of `search`. The key is owned so it can move to the worker.
    pub async fn search_async(
        &self,
        key: Option<String>,
        mode: SearchMode,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let root: PathBuf = self.full_path().to_path_buf();
        tokio::task::spawn_blocking(move || search_children(&root, key.as_deref(), mode)).await?
    }

    /// Background variant of `compute_aggregate_size`.
    pub async fn compute_aggregate_size_async(&self) -> Result<u64, ManagerError> {
        let entity: DirectoryEntity = self.entity.clone();
        let size: u64 =
            tokio::task::spawn_blocking(move || entity.compute_aggregate_size()).await??;
        Ok(size)
    }

    /// Apply one rename strategy to a batch of directories.
    ///
    /// Entities are updated in place as they are renamed. The batch is not
    /// transactional: a failure leaves earlier renames committed.
    pub fn rename_all(
        directories: &mut [DirectoryEntity],
        strategy: RenameStrategy,
        options: &RenameOptions,
    ) -> Result<RenameReport, ManagerError> {
        let report: RenameReport =
            RenameEngine::new(&LOCAL_FILE_SYSTEM).rename_all(directories, strategy, options)?;
        tracing::debug!(
            "Renamed {} directories ({} unchanged) with {:?}",
            report.renamed,
            report.skipped,
            strategy
        );
        Ok(report)
    }

    /// Move every directory into `dest_dir`, creating it if missing.
    ///
    /// # Returns
    /// The moved entities, in input order.
    pub fn move_all(
        directories: &[DirectoryEntity],
        dest_dir: impl AsRef<Path>,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let dest_dir: PathBuf = normalize_full_path(dest_dir.as_ref())?;
        std::fs::create_dir_all(&dest_dir).map_err(|e| FileSystemError::io(&dest_dir, e))?;

        let mut moved: Vec<DirectoryEntity> = Vec::with_capacity(directories.len());
        for directory in directories {
            let path: PathBuf = move_directory(directory.full_path(), &dest_dir)?;
            moved.push(DirectoryEntity::from_path(path)?);
        }
        Ok(moved)
    }

    /// Copy every directory into `dest_dir`.
    ///
    /// # Returns
    /// The copies, in input order.
    pub fn copy_all(
        directories: &[DirectoryEntity],
        dest_dir: impl AsRef<Path>,
        copy_subdirs: bool,
        overwrite_files: bool,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let dest_dir: PathBuf = normalize_full_path(dest_dir.as_ref())?;

        let mut copies: Vec<DirectoryEntity> = Vec::with_capacity(directories.len());
        for directory in directories {
            let path: PathBuf =
                copy_directory(directory.full_path(), &dest_dir, copy_subdirs, overwrite_files)?;
            copies.push(DirectoryEntity::from_path(path)?);
        }
        Ok(copies)
    }

    /// Background variant of `rename_all`.
    ///
    /// # Returns
    /// The batch with renamed entities refreshed.
    pub async fn rename_all_async(
        mut directories: Vec<DirectoryEntity>,
        strategy: RenameStrategy,
        options: RenameOptions,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        tokio::task::spawn_blocking(move || -> Result<Vec<DirectoryEntity>, ManagerError> {
            Self::rename_all(&mut directories, strategy, &options)?;
            Ok(directories)
        })
        .await?
    }

    /// Background variant of `move_all`.
    pub async fn move_all_async(
        directories: Vec<DirectoryEntity>,
        dest_dir: impl Into<PathBuf>,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let dest_dir: PathBuf = dest_dir.into();
        tokio::task::spawn_blocking(move || Self::move_all(&directories, &dest_dir)).await?
    }

    /// Background variant of `copy_all`.
    pub async fn copy_all_async(
        directories: Vec<DirectoryEntity>,
        dest_dir: impl Into<PathBuf>,
        copy_subdirs: bool,
        overwrite_files: bool,
    ) -> Result<Vec<DirectoryEntity>, ManagerError> {
        let dest_dir: PathBuf = dest_dir.into();
        tokio::task::spawn_blocking(move || {
            Self::copy_all(&directories, &dest_dir, copy_subdirs, overwrite_files)
        })
        .await?
    }

    /// The current user's desktop directory.
    ///
    /// # Errors
    /// Returns `UnknownPlatform` on unsupported platforms.
    pub fn desktop_path() -> Result<PathBuf, ManagerError> {
        Ok(rusty_dirmanager_common::desktop_path()?)
    }

    /// Start watching the directory. Idempotent.
    pub fn enable_change_notification(&self) -> Result<(), ManagerError> {
        Ok(self.notifier.enable()?)
    }

    /// Stop watching the directory. Safe to call when not enabled.
    pub fn disable_change_notification(&self) {
        self.notifier.disable();
    }

    /// Check whether the directory is being watched.
    pub fn is_change_notification_enabled(&self) -> bool {
        self.notifier.is_enabled()
    }

    /// Register a callback for change events.
    ///
    /// Callbacks run on the notifier's delivery thread. They may query the
    /// handle's notification state or disable it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Remove a callback registered with `subscribe`.
    ///
    /// # Returns
    /// `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Receive change events through a channel.
    pub fn events(&self) -> EventStream {
        self.notifier.events()
    }

    fn relocate(&mut self, entity: DirectoryEntity) {
        tracing::debug!(
            "{} is now {}",
            self.entity.full_path().display(),
            entity.full_path().display()
        );
        self.notifier = ChangeNotifier::new(entity.full_path(), self.watch_options);
        self.entity = entity;
    }
}

fn compare_children(
    left: &Path,
    right: &Path,
    output: OutputSelector,
    key: EquivalenceKey,
) -> Result<Vec<DirectoryEntity>, ManagerError> {
    let children: Vec<DirectoryEntity> =
        rusty_dirmanager_filesystem::compare(left, right, output, key)?
            .collect::<Result<Vec<DirectoryEntity>, FileSystemError>>()?;
    Ok(children)
}

fn search_children(
    root: &Path,
    key: Option<&str>,
    mode: SearchMode,
) -> Result<Vec<DirectoryEntity>, ManagerError> {
    let children: Vec<DirectoryEntity> = SearchEngine::new(&LOCAL_FILE_SYSTEM)
        .search(root, key, mode)?
        .collect::<Result<Vec<DirectoryEntity>, FileSystemError>>()?;
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use rusty_dirmanager_watcher::ChangeKind;
    use tempfile::TempDir;

    fn names(entities: &[DirectoryEntity]) -> Vec<String> {
        entities.iter().map(|e| e.name().to_string()).collect()
    }

    fn make_dirs(root: &Path, children: &[&str]) {
        for child in children {
            std::fs::create_dir_all(root.join(child)).unwrap();
        }
    }

    #[test]
    fn test_open_missing_without_create() {
        let temp: TempDir = TempDir::new().unwrap();

        let result: Result<DirectoryHandle, ManagerError> =
            DirectoryHandle::open(temp.path().join("missing"), HandleOptions::default());

        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_open_creates_when_asked() {
        // Given: A nested path that does not exist yet
        let temp: TempDir = TempDir::new().unwrap();
        let path: PathBuf = temp.path().join("a").join("b");
        let options: HandleOptions = HandleOptions::default().with_create_if_missing(true);

        // When: Opening with create_if_missing
        let handle: DirectoryHandle = DirectoryHandle::open(&path, options).unwrap();

        // Then: The directory exists and the handle describes it
        assert!(handle.exists());
        assert_eq!(handle.name(), "b");
        assert_eq!(handle.parent().unwrap().name(), "a");
        assert_eq!(handle.root(), handle.full_path().ancestors().last().unwrap());
    }

    #[test]
    fn test_counts_and_sizes() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["one", "two"]);
        std::fs::write(temp.path().join("f.txt"), b"12345").unwrap();
        std::fs::write(temp.path().join("one").join("g.txt"), b"123").unwrap();

        let handle: DirectoryHandle =
            DirectoryHandle::open(temp.path(), HandleOptions::default()).unwrap();

        assert_eq!(handle.subdirectory_count().unwrap(), 2);
        assert_eq!(handle.file_count().unwrap(), 1);
        assert_eq!(handle.compute_aggregate_size().unwrap(), 8);
        assert_eq!(names(&handle.subdirectories().unwrap()), vec!["one", "two"]);
        assert!(handle.last_write_time().is_ok());
        assert!(handle.last_access_time().is_ok());
    }

    #[test]
    fn test_create_subdirectory_validates_name() {
        let temp: TempDir = TempDir::new().unwrap();
        let handle: DirectoryHandle =
            DirectoryHandle::open(temp.path(), HandleOptions::default()).unwrap();

        let child: DirectoryHandle = handle.create_subdirectory("child").unwrap();
        assert!(child.exists());

        let invalid: Result<DirectoryHandle, ManagerError> = handle.create_subdirectory("a*b");
        assert!(matches!(
            invalid,
            Err(ManagerError::FileSystem(FileSystemError::InvalidName { .. }))
        ));

        let taken: Result<DirectoryHandle, ManagerError> = handle.create_subdirectory("child");
        assert!(matches!(
            taken,
            Err(ManagerError::FileSystem(FileSystemError::IoError { .. }))
        ));
    }

    #[test]
    fn test_delete_non_recursive_requires_empty() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["full/inner", "empty"]);

        let full: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("full"), HandleOptions::default()).unwrap();
        assert!(full.delete(false).is_err());

        let full: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("full"), HandleOptions::default()).unwrap();
        full.delete(true).unwrap();
        assert!(!temp.path().join("full").exists());

        let empty: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("empty"), HandleOptions::default()).unwrap();
        empty.delete(false).unwrap();
        assert!(!temp.path().join("empty").exists());
    }

    #[test]
    fn test_compare_and_search() {
        // Given: A = {a, b, c}, B = {b, c, d}
        let temp: TempDir = TempDir::new().unwrap();
        let left: PathBuf = temp.path().join("A");
        let right: PathBuf = temp.path().join("B");
        make_dirs(&left, &["a", "b", "c"]);
        make_dirs(&right, &["b", "c", "d"]);
        let handle: DirectoryHandle =
            DirectoryHandle::open(&left, HandleOptions::default()).unwrap();

        // When: Comparing by name both ways
        let matching: Vec<DirectoryEntity> = handle
            .compare(&right, OutputSelector::Matching, EquivalenceKey::Name)
            .unwrap();
        let non_matching: Vec<DirectoryEntity> = handle
            .compare(&right, OutputSelector::NonMatching, EquivalenceKey::Name)
            .unwrap();

        // Then: The children are partitioned
        assert_eq!(names(&matching), vec!["b", "c"]);
        assert_eq!(names(&non_matching), vec!["a"]);

        let found: Vec<DirectoryEntity> = handle.search(Some("B"), SearchMode::Name).unwrap();
        assert_eq!(names(&found), vec!["b"]);
    }

    #[test]
    fn test_rename_updates_handle() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["before"]);
        let mut handle: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("before"), HandleOptions::default()).unwrap();

        handle.rename("after").unwrap();

        assert_eq!(handle.name(), "after");
        assert_eq!(handle.full_path(), temp.path().join("after"));
        assert!(handle.exists());
        assert!(!temp.path().join("before").exists());
    }

    #[test]
    fn test_rename_resets_notification() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["watched"]);
        let mut handle: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("watched"), HandleOptions::default()).unwrap();
        handle.enable_change_notification().unwrap();

        handle.rename("moved").unwrap();

        assert!(!handle.is_change_notification_enabled());
        handle.enable_change_notification().unwrap();
        assert!(handle.is_change_notification_enabled());
    }

    #[test]
    fn test_generate_random_name() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["plain"]);
        let mut handle: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("plain"), HandleOptions::default()).unwrap();

        handle.generate_random_name().unwrap();

        assert_ne!(handle.name(), "plain");
        assert!(handle.exists());
    }

    #[test]
    fn test_move_and_copy() {
        let temp: TempDir = TempDir::new().unwrap();
        make_dirs(temp.path(), &["src/nested", "dest"]);
        std::fs::write(temp.path().join("src").join("f.txt"), b"x").unwrap();
        let mut handle: DirectoryHandle =
            DirectoryHandle::open(temp.path().join("src"), HandleOptions::default()).unwrap();

        let copy: DirectoryHandle = handle
            .copy_to(temp.path().join("copies"), true, false)
            .unwrap();
        assert!(copy.full_path().join("nested").exists());
        assert!(copy.full_path().join("f.txt").exists());

        handle.move_to(temp.path().join("dest")).unwrap();
        assert_eq!(handle.full_path(), temp.path().join("dest").join("src"));
        assert!(!temp.path().join("src").exists());
    }

    #[test]
    fn test_rename_all_and_move_all() {
        // Given: Three directories in name order
        let temp: TempDir = TempDir::new().unwrap();
        let root: PathBuf = temp.path().join("root");
        make_dirs(&root, &["x", "y", "z"]);
        let handle: DirectoryHandle =
            DirectoryHandle::open(&root, HandleOptions::default()).unwrap();
        let mut batch: Vec<DirectoryEntity> = handle.subdirectories().unwrap();

        // When: Numbering them and moving them out
        let report: RenameReport = DirectoryHandle::rename_all(
            &mut batch,
            RenameStrategy::AddIncrementalNumbersToBeginning,
            &RenameOptions::default(),
        )
        .unwrap();
        let moved: Vec<DirectoryEntity> =
            DirectoryHandle::move_all(&batch, temp.path().join("out")).unwrap();

        // Then: Names are numbered in order and now live under out/
        assert_eq!(report.renamed, 3);
        assert_eq!(names(&moved), vec!["1-x", "2-y", "3-z"]);
        assert!(moved.iter().all(|e| e.full_path().starts_with(temp.path().join("out"))));
        assert_eq!(handle.subdirectory_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let temp: TempDir = TempDir::new().unwrap();
        let left: PathBuf = temp.path().join("A");
        let right: PathBuf = temp.path().join("B");
        make_dirs(&left, &["a", "b"]);
        make_dirs(&right, &["b"]);
        std::fs::write(left.join("a").join("f.bin"), vec![0u8; 16]).unwrap();
        let handle: DirectoryHandle =
            DirectoryHandle::open(&left, HandleOptions::default()).unwrap();

        let matching: Vec<DirectoryEntity> = handle
            .compare_async(&right, OutputSelector::Matching, EquivalenceKey::Name)
            .await
            .unwrap();
        assert_eq!(names(&matching), vec!["b"]);

        let found: Vec<DirectoryEntity> = handle
            .search_async(Some("^a$".to_string()), SearchMode::Regex)
            .await
            .unwrap();
        assert_eq!(names(&found), vec!["a"]);

        assert_eq!(handle.compute_aggregate_size_async().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_async_batches() {
        let temp: TempDir = TempDir::new().unwrap();
        let root: PathBuf = temp.path().join("root");
        make_dirs(&root, &["p", "q"]);
        let batch: Vec<DirectoryEntity> = DirectoryHandle::open(&root, HandleOptions::default())
            .unwrap()
            .subdirectories()
            .unwrap();

        let options: RenameOptions = RenameOptions::default().with_separator(Some('.'));
        let renamed: Vec<DirectoryEntity> = DirectoryHandle::rename_all_async(
            batch,
            RenameStrategy::AddIncrementalNumbersToEnd,
            options,
        )
        .await
        .unwrap();
        assert_eq!(names(&renamed), vec!["p.1", "q.2"]);

        let copies: Vec<DirectoryEntity> =
            DirectoryHandle::copy_all_async(renamed.clone(), temp.path().join("copies"), true, false)
                .await
                .unwrap();
        assert_eq!(names(&copies), vec!["p.1", "q.2"]);

        let moved: Vec<DirectoryEntity> =
            DirectoryHandle::move_all_async(renamed, temp.path().join("moved"))
                .await
                .unwrap();
        assert_eq!(moved.len(), 2);
        assert!(!root.join("p.1").exists());
    }

    #[tokio::test]
    async fn test_async_propagates_errors() {
        let temp: TempDir = TempDir::new().unwrap();
        let handle: DirectoryHandle =
            DirectoryHandle::open(temp.path(), HandleOptions::default()).unwrap();

        let result: Result<Vec<DirectoryEntity>, ManagerError> = handle
            .search_async(Some("(".to_string()), SearchMode::Regex)
            .await;

        assert!(matches!(
            result,
            Err(ManagerError::FileSystem(FileSystemError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn test_notification_through_handle() {
        // Given: A handle with notification enabled
        let temp: TempDir = TempDir::new().unwrap();
        let handle: DirectoryHandle =
            DirectoryHandle::open(temp.path(), HandleOptions::default()).unwrap();
        let stream: EventStream = handle.events();
        handle.enable_change_notification().unwrap();
        assert!(handle.is_change_notification_enabled());

        // When: A child is created through the handle
        let child: DirectoryHandle = handle.create_subdirectory("fresh").unwrap();

        // Then: A Created event for the child arrives
        let deadline: Instant = Instant::now() + Duration::from_secs(5);
        let mut seen: Option<ChangeEvent> = None;
        while seen.is_none() && Instant::now() < deadline {
            seen = stream
                .recv_timeout(Duration::from_millis(50))
                .filter(|e| e.kind() == ChangeKind::Created);
        }
        let event: ChangeEvent = seen.unwrap();
        assert_eq!(event.full_path(), child.full_path());

        handle.disable_change_notification();
        assert!(!handle.is_change_notification_enabled());
    }
}
