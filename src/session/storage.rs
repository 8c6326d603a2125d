use parking_lot::RwLock;

use super::error::SessionError;
use super::record::SessionData;

/// Consumer-provided session persistence.
///
/// Holds at most one record. Implementations must make `write` an atomic
/// replace: a concurrent or later `read` returns the old record or the new
/// one, never a mix.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStorage for LocalStorage {
///     fn read(&self) -> Result<Option<SessionData>, SessionError> {
///         match self.get_item("telecopy_session")? {
///             Some(raw) => serde_json::from_str(&raw)
///                 .map(Some)
///                 .map_err(|e| SessionError::Corrupt(e.to_string())),
///             None => Ok(None),
///         }
///     }
///     // ...
/// }
/// ```
pub trait SessionStorage: Send + Sync + 'static {
    /// Read the persisted record, if any.
    fn read(&self) -> Result<Option<SessionData>, SessionError>;

    /// Replace the persisted record.
    fn write(&self, session: &SessionData) -> Result<(), SessionError>;

    /// Remove the persisted record. Removing nothing is not an error.
    fn remove(&self) -> Result<(), SessionError>;
}

/// Process-local storage. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: RwLock<Option<SessionData>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<SessionData>, SessionError> {
        Ok(self.slot.read().clone())
    }

    fn write(&self, session: &SessionData) -> Result<(), SessionError> {
        *self.slot.write() = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        self.slot.write().take();
        Ok(())
    }
}

#[cfg(feature = "file-store")]
pub use file::FileStorage;

#[cfg(feature = "file-store")]
mod file {
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{SessionData, SessionError, SessionStorage};

    /// JSON file storage that survives restarts.
    ///
    /// Writes go to a sibling `.tmp` file which is then renamed over the
    /// target, so the record on disk is always complete.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn tmp_path(&self) -> PathBuf {
            let mut name = self.path.file_name().unwrap_or_default().to_os_string();
            name.push(".tmp");
            self.path.with_file_name(name)
        }
    }

    impl SessionStorage for FileStorage {
        fn read(&self) -> Result<Option<SessionData>, SessionError> {
            let content = match std::fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(SessionError::Storage(format!(
                        "read {}: {e}",
                        self.path.display()
                    )));
                }
            };
            serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| SessionError::Corrupt(e.to_string()))
        }

        fn write(&self, session: &SessionData) -> Result<(), SessionError> {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SessionError::Storage(format!("create {}: {e}", parent.display()))
                })?;
            }

            let content = serde_json::to_vec_pretty(session)
                .map_err(|e| SessionError::Storage(format!("serialize session: {e}")))?;

            let tmp_path = self.tmp_path();
            if let Err(e) = std::fs::write(&tmp_path, content) {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(SessionError::Storage(format!(
                    "write {}: {e}",
                    tmp_path.display()
                )));
            }

            if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(SessionError::Storage(format!(
                    "rename {} to {}: {e}",
                    tmp_path.display(),
                    self.path.display()
                )));
            }
            Ok(())
        }

        fn remove(&self) -> Result<(), SessionError> {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(SessionError::Storage(format!(
                    "remove {}: {e}",
                    self.path.display()
                ))),
            }
        }
    }
}
