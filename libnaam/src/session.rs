//! Session persistence and the single session owner
//!
//! The session is a handful of key-value entries written at login and
//! cleared at logout:
//!
//! | Key              | Value                          |
//! |------------------|--------------------------------|
//! | `authToken`      | bearer token                   |
//! | `userId`         | user id                        |
//! | `userRole`       | `farmer` / `investor` / `serviceProvider` |
//! | `userData`       | cached profile, JSON           |
//! | `profile_images` | uploaded image URLs, JSON array |
//!
//! `SessionStore` abstracts where those entries live (`FileStore`,
//! `KeyringStore`, `MemoryStore`). `SessionManager` is the only thing
//! that reads or writes them: every request takes its token from the
//! manager, and an HTTP 401 anywhere invalidates the session for everyone.
//!
//! # Example
//!
//! ```no_run
//! use libnaam::session::{MemoryStore, SessionInfo, SessionManager};
//! use libnaam::service::events::EventBus;
//! use libnaam::types::{UserProfile, UserRole};
//!
//! # fn example() -> libnaam::Result<()> {
//! let manager = SessionManager::new(Box::new(MemoryStore::new()), EventBus::new(16));
//! manager.begin(
//!     "token-from-verify-otp".to_string(),
//!     SessionInfo {
//!         user_id: "42".to_string(),
//!         user_role: UserRole::Farmer,
//!         user_data: UserProfile::default(),
//!         profile_images: vec![],
//!     },
//! )?;
//! assert!(manager.is_authenticated());
//! manager.logout()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{SessionBackend, SessionConfig};
use crate::error::{Result, SessionError};
use crate::service::events::{Event, EventBus, EventReceiver};
use crate::types::{UserProfile, UserRole};

pub const KEY_AUTH_TOKEN: &str = "authToken";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_USER_ROLE: &str = "userRole";
pub const KEY_USER_DATA: &str = "userData";
pub const KEY_PROFILE_IMAGES: &str = "profile_images";

pub const SESSION_KEYS: [&str; 5] = [
    KEY_AUTH_TOKEN,
    KEY_USER_ID,
    KEY_USER_ROLE,
    KEY_USER_DATA,
    KEY_PROFILE_IMAGES,
];

/// Key-value storage for session entries
///
/// Removing a key that does not exist is not an error.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every session key
    fn clear(&self) -> Result<()> {
        for key in SESSION_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Identifier used in logs, e.g. "file" or "keyring"
    fn backend_name(&self) -> &str;
}

// ============================================================================
// Backends
// ============================================================================

/// Process-local store; nothing survives a restart
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Refuse to read or write a session file through a symlink
pub fn validate_not_symlink(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_symlink() => Err(SessionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "Session file '{}' is a symbolic link. Use a regular file instead.",
                path.display()
            ),
        ))
        .into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SessionError::Io(e).into()),
    }
}

/// All entries in one JSON file, permissions 600 on Unix
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        validate_not_symlink(&self.path)?;
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(SessionError::Io)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            SessionError::Corrupt(format!("{}: {}", self.path.display(), e)).into()
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        validate_not_symlink(&self.path)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(SessionError::Io)?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(SessionError::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(SessionError::Io)?;
        }
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        validate_not_symlink(&self.path)?;
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(SessionError::Io)?;
        }
        tracing::debug!("Removed session file {:?}", self.path);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// OS keyring (Keychain, Credential Manager, Secret Service)
///
/// Each key becomes one keyring entry under the service name `naam`.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// # Errors
    ///
    /// Returns `SessionError::KeyringUnavailable` when the OS keyring
    /// cannot be reached (headless Linux without Secret Service, containers).
    pub fn new() -> Result<Self> {
        keyring::Entry::new("naam", "availability_check")
            .map_err(|e| SessionError::KeyringUnavailable(e.to_string()))?;
        Ok(Self {
            service: "naam".to_string(),
        })
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| SessionError::KeyringUnavailable(e.to_string()).into())
    }
}

impl SessionStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SessionError::Keyring(e.to_string()).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SessionError::Keyring(e.to_string()))?;
        tracing::debug!("Stored session key {} in OS keyring", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SessionError::Keyring(e.to_string()).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

/// Build the configured store
///
/// A keyring that cannot be reached falls back to the session file.
pub fn open_store(config: &SessionConfig) -> Box<dyn SessionStore> {
    match config.storage {
        SessionBackend::Memory => Box::new(MemoryStore::new()),
        SessionBackend::File => Box::new(FileStore::new(config.expand_path())),
        SessionBackend::Keyring => match KeyringStore::new() {
            Ok(store) => {
                tracing::debug!("Using OS keyring for session storage");
                Box::new(store)
            }
            Err(e) => {
                tracing::warn!("{}. Falling back to the session file.", e);
                Box::new(FileStore::new(config.expand_path()))
            }
        },
    }
}

// ============================================================================
// Session manager
// ============================================================================

/// Everything about the session except the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub user_role: UserRole,
    pub user_data: UserProfile,
    pub profile_images: Vec<String>,
}

struct ActiveSession {
    token: SecretString,
    info: SessionInfo,
}

impl ActiveSession {
    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

pub struct SessionManager {
    store: Box<dyn SessionStore>,
    active: RwLock<Option<ActiveSession>>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(store: Box<dyn SessionStore>, events: EventBus) -> Self {
        Self {
            store,
            active: RwLock::new(None),
            events,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// Read the persisted session into memory
    ///
    /// Returns `None` when no token is stored. A stored token with a
    /// missing or unknown role is reported as corrupt.
    pub fn load(&self) -> Result<Option<SessionInfo>> {
        let Some(token) = self.store.get(KEY_AUTH_TOKEN)?.filter(|t| !t.is_empty()) else {
            *self.write_active() = None;
            return Ok(None);
        };

        let user_id = self.store.get(KEY_USER_ID)?.unwrap_or_default();
        let role_raw = self
            .store
            .get(KEY_USER_ROLE)?
            .ok_or_else(|| SessionError::Corrupt("userRole is missing".to_string()))?;
        let user_role: UserRole = role_raw.parse().map_err(SessionError::Corrupt)?;

        let user_data = match self.store.get(KEY_USER_DATA)? {
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => UserProfile::from_server_payload(&value),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable cached profile: {}", e);
                    UserProfile::default()
                }
            },
            None => UserProfile::default(),
        };

        let profile_images = self
            .store
            .get(KEY_PROFILE_IMAGES)?
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        let info = SessionInfo {
            user_id,
            user_role,
            user_data,
            profile_images,
        };
        tracing::debug!(
            "Loaded session for user {} from {} store",
            info.user_id,
            self.store.backend_name()
        );

        *self.write_active() = Some(ActiveSession {
            token: SecretString::from(token),
            info: info.clone(),
        });
        Ok(Some(info))
    }

    /// Persist a fresh session (after OTP verification)
    pub fn begin(&self, token: String, info: SessionInfo) -> Result<()> {
        self.store.set(KEY_AUTH_TOKEN, &token)?;
        self.store.set(KEY_USER_ID, &info.user_id)?;
        self.store.set(KEY_USER_ROLE, info.user_role.as_str())?;
        self.store.set(KEY_USER_DATA, &profile_json(&info.user_data)?)?;
        self.store.set(KEY_PROFILE_IMAGES, &images_json(&info.profile_images)?)?;

        let event = Event::LoggedIn {
            user_id: info.user_id.clone(),
            role: info.user_role,
        };
        *self.write_active() = Some(ActiveSession {
            token: SecretString::from(token),
            info,
        });
        self.events.emit(event);
        Ok(())
    }

    pub fn current(&self) -> Option<SessionInfo> {
        self.read_active().as_ref().map(|s| s.info.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_active().is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.read_active().as_ref().map(|s| s.info.user_id.clone())
    }

    pub fn role(&self) -> Option<UserRole> {
        self.read_active().as_ref().map(|s| s.info.user_role)
    }

    /// `Authorization` header value for the current token
    pub(crate) fn bearer(&self) -> Option<String> {
        self.read_active().as_ref().map(ActiveSession::bearer)
    }

    /// Overwrite the cached profile after the server accepted an edit
    pub fn update_user_data(&self, profile: UserProfile) -> Result<()> {
        let user_id = {
            let mut active = self.write_active();
            let Some(session) = active.as_mut() else {
                return Err(SessionError::Invalidated("no active session".to_string()).into());
            };
            session.info.user_data = profile;
            self.store
                .set(KEY_USER_DATA, &profile_json(&session.info.user_data)?)?;
            session.info.user_id.clone()
        };
        self.events.emit(Event::ProfileUpdated { user_id });
        Ok(())
    }

    pub fn set_profile_images(&self, urls: Vec<String>) -> Result<()> {
        let mut active = self.write_active();
        let Some(session) = active.as_mut() else {
            return Err(SessionError::Invalidated("no active session".to_string()).into());
        };
        self.store.set(KEY_PROFILE_IMAGES, &images_json(&urls)?)?;
        session.info.profile_images = urls;
        Ok(())
    }

    /// Clear the session at the user's request
    pub fn logout(&self) -> Result<()> {
        *self.write_active() = None;
        self.store.clear()?;
        self.events.emit(Event::LoggedOut);
        Ok(())
    }

    /// Clear the session because the server no longer accepts the token
    ///
    /// Storage failures are logged, not returned: the in-memory session is
    /// gone either way and callers are already handling an auth failure.
    pub fn invalidate(&self, reason: &str) {
        let mut active = self.write_active();
        let was_active = active.take().is_some();
        self.clear_store_after_rejection();
        drop(active);
        if was_active {
            self.announce_invalidation(reason);
        }
    }

    /// Invalidate only if `bearer` is still the current token
    ///
    /// A rejection of a token that has since been replaced by a new login
    /// leaves the new session alone. Returns whether the session was cleared.
    pub(crate) fn invalidate_bearer(&self, bearer: &str, reason: &str) -> bool {
        let mut active = self.write_active();
        if active.as_ref().map(ActiveSession::bearer).as_deref() != Some(bearer) {
            tracing::debug!("Ignoring rejection of a replaced token: {}", reason);
            return false;
        }
        *active = None;
        self.clear_store_after_rejection();
        drop(active);
        self.announce_invalidation(reason);
        true
    }

    fn clear_store_after_rejection(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear session storage: {}", e);
        }
    }

    fn announce_invalidation(&self, reason: &str) {
        tracing::info!("Session invalidated: {}", reason);
        self.events.emit(Event::SessionInvalidated {
            reason: reason.to_string(),
        });
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    fn read_active(&self) -> std::sync::RwLockReadGuard<'_, Option<ActiveSession>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_active(&self) -> std::sync::RwLockWriteGuard<'_, Option<ActiveSession>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn profile_json(profile: &UserProfile) -> Result<String> {
    serde_json::to_string(profile).map_err(|e| SessionError::Corrupt(e.to_string()).into())
}

fn images_json(urls: &[String]) -> Result<String> {
    serde_json::to_string(urls).map_err(|e| SessionError::Corrupt(e.to_string()).into())
}
