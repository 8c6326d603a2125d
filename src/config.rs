use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
#[cfg(feature = "file-store")]
use crate::session::FileStorage;
use crate::session::SessionStore;

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Wizard limits shared by the config and the running machine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WizardSettings {
    pub(crate) max_failed_attempts: u32,
    pub(crate) resend_cooldown: Duration,
}

/// Client configuration.
///
/// The attempt ceiling and the resend cooldown are business decisions with no
/// safe default, so they are constructor parameters.
///
/// Use [`from_env()`](ClientConfig::from_env) for convention-based setup,
/// or [`new()`](ClientConfig::new) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) wizard: WizardSettings,
    pub(crate) remote_timeout: Duration,
    pub(crate) session_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Create config with the required wizard limits.
    ///
    /// - `max_failed_attempts`: failed code (or 2FA) submissions tolerated
    ///   before the wizard restarts at the phone step. Values below 1 are
    ///   treated as 1.
    /// - `resend_cooldown`: wait before a code may be re-sent, used when the
    ///   backend does not send its own cooldown.
    #[must_use]
    pub fn new(max_failed_attempts: u32, resend_cooldown: Duration) -> Self {
        Self {
            wizard: WizardSettings {
                max_failed_attempts: max_failed_attempts.max(1),
                resend_cooldown,
            },
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            session_file: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `TELECOPY_MAX_FAILED_ATTEMPTS`: positive integer
    /// - `TELECOPY_RESEND_COOLDOWN_SECS`: seconds
    ///
    /// # Optional env vars
    /// - `TELECOPY_REMOTE_TIMEOUT_SECS`: per-call timeout (default 30)
    /// - `TELECOPY_SESSION_FILE`: persist the session to this JSON file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required var is missing or any value
    /// does not parse.
    pub fn from_env() -> Result<Self, Error> {
        let max_failed_attempts: u32 = required("TELECOPY_MAX_FAILED_ATTEMPTS")?;
        if max_failed_attempts == 0 {
            return Err(Error::Config(
                "TELECOPY_MAX_FAILED_ATTEMPTS must be at least 1".into(),
            ));
        }
        let cooldown_secs: u64 = required("TELECOPY_RESEND_COOLDOWN_SECS")?;

        let mut config = Self::new(max_failed_attempts, Duration::from_secs(cooldown_secs));

        if let Some(secs) = optional::<u64>("TELECOPY_REMOTE_TIMEOUT_SECS")? {
            config = config.with_remote_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = std::env::var("TELECOPY_SESSION_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
        {
            config = config.with_session_file(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn max_failed_attempts(&self) -> u32 {
        self.wizard.max_failed_attempts
    }

    #[must_use]
    pub fn resend_cooldown(&self) -> Duration {
        self.wizard.resend_cooldown
    }

    #[must_use]
    pub fn remote_timeout(&self) -> Duration {
        self.remote_timeout
    }

    #[must_use]
    pub fn session_file(&self) -> Option<&PathBuf> {
        self.session_file.as_ref()
    }

    /// Build the session store this config describes: file-backed when a
    /// session file is set, in-memory otherwise.
    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        match &self.session_file {
            #[cfg(feature = "file-store")]
            Some(path) => SessionStore::new(FileStorage::new(path.clone())),
            #[cfg(not(feature = "file-store"))]
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "Session file configured but the file-store feature is disabled"
                );
                SessionStore::in_memory()
            }
            None => SessionStore::in_memory(),
        }
    }
}

fn required<T>(name: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(name)?.ok_or_else(|| Error::Config(format!("{name} is required")))
}

fn optional<T>(name: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "TELECOPY_MAX_FAILED_ATTEMPTS",
        "TELECOPY_RESEND_COOLDOWN_SECS",
        "TELECOPY_REMOTE_TIMEOUT_SECS",
        "TELECOPY_SESSION_FILE",
    ];

    fn with_env<F: FnOnce()>(values: [Option<&str>; 4], f: F) {
        temp_env::with_vars(
            [
                (VARS[0], values[0]),
                (VARS[1], values[1]),
                (VARS[2], values[2]),
                (VARS[3], values[3]),
            ],
            f,
        );
    }

    #[test]
    fn test_config_constructor() {
        let config = ClientConfig::new(5, Duration::from_secs(60));
        assert_eq!(config.max_failed_attempts(), 5);
        assert_eq!(config.resend_cooldown(), Duration::from_secs(60));
        assert_eq!(config.remote_timeout(), DEFAULT_REMOTE_TIMEOUT);
        assert_eq!(config.session_file(), None);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(ClientConfig::new(0, Duration::ZERO).max_failed_attempts(), 1);
    }

    #[test]
    fn test_from_env_full() {
        with_env(
            [Some("3"), Some("45"), Some("10"), Some("/tmp/telecopy/session.json")],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.max_failed_attempts(), 3);
                assert_eq!(config.resend_cooldown(), Duration::from_secs(45));
                assert_eq!(config.remote_timeout(), Duration::from_secs(10));
                assert_eq!(
                    config.session_file(),
                    Some(&PathBuf::from("/tmp/telecopy/session.json"))
                );
            },
        );
    }

    #[test]
    fn test_from_env_defaults() {
        with_env([Some("5"), Some("60"), None, None], || {
            let config = ClientConfig::from_env().unwrap();
            assert_eq!(config.remote_timeout(), DEFAULT_REMOTE_TIMEOUT);
            assert_eq!(config.session_file(), None);
        });
    }

    #[test]
    fn test_from_env_blank_session_file_is_ignored() {
        with_env([Some("5"), Some("60"), None, Some("   ")], || {
            let config = ClientConfig::from_env().unwrap();
            assert_eq!(config.session_file(), None);
        });
    }

    #[test]
    fn test_from_env_missing_required() {
        with_env([None, Some("60"), None, None], || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TELECOPY_MAX_FAILED_ATTEMPTS"));
        });
        with_env([Some("5"), None, None, None], || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TELECOPY_RESEND_COOLDOWN_SECS"));
        });
    }

    #[test]
    fn test_from_env_rejects_bad_values() {
        with_env([Some("0"), Some("60"), None, None], || {
            assert!(matches!(ClientConfig::from_env(), Err(Error::Config(_))));
        });
        with_env([Some("five"), Some("60"), None, None], || {
            assert!(matches!(ClientConfig::from_env(), Err(Error::Config(_))));
        });
        with_env([Some("5"), Some("60"), Some("-1"), None], || {
            assert!(matches!(ClientConfig::from_env(), Err(Error::Config(_))));
        });
    }

    #[test]
    fn test_session_store_defaults_to_memory() {
        let store = ClientConfig::new(5, Duration::from_secs(60)).session_store();
        assert!(!store.is_valid());
    }

    #[cfg(feature = "file-store")]
    #[test]
    fn test_session_store_uses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = ClientConfig::new(5, Duration::from_secs(60))
            .with_session_file(&path)
            .session_store();
        store.clear().unwrap();
        assert!(!store.is_valid());
        assert!(!path.exists());
    }
}
