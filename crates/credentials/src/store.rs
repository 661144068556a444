use crate::error::{CredentialError, Result};
use crate::hashing::{constant_time_eq, hash_password};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const USERS_DB_ENV: &str = "CROPCAST_USERS_DB";
pub const DEFAULT_USERS_DB: &str = "users.json";

const TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    InvalidCredentials,
}

/// Email/password registry used by the signup and login endpoints.
///
/// Implementations block on I/O; async callers should wrap calls in
/// `spawn_blocking`.
pub trait CredentialStore: Send + Sync {
    fn signup(&self, email: &str, password: &str) -> Result<SignupOutcome>;
    fn login(&self, email: &str, password: &str) -> Result<LoginOutcome>;
}

fn normalize<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CredentialError::InvalidInput("email is required"));
    }
    if password.is_empty() {
        return Err(CredentialError::InvalidInput("password is required"));
    }
    Ok(email)
}

fn verify(stored_hash: Option<&String>, password: &str) -> LoginOutcome {
    match stored_hash {
        Some(stored) if constant_time_eq(stored.as_bytes(), hash_password(password).as_bytes()) => {
            LoginOutcome::Authenticated
        }
        _ => LoginOutcome::InvalidCredentials,
    }
}

/// Process-local store; contents vanish on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn signup(&self, email: &str, password: &str) -> Result<SignupOutcome> {
        let email = normalize(email, password)?;
        let mut users = self
            .users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if users.contains_key(email) {
            return Ok(SignupOutcome::AlreadyExists);
        }
        users.insert(email.to_string(), hash_password(password));
        Ok(SignupOutcome::Created)
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize(email, password)?;
        let users = self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(verify(users.get(email), password))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserTable {
    version: u32,
    #[serde(default)]
    users: BTreeMap<String, String>,
}

/// JSON file store: `{"version": 1, "users": {"<email>": "<sha256 hex>"}}`.
///
/// Every operation takes an exclusive lock on `<path>.lock`, so several
/// processes can share one file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    /// `CROPCAST_USERS_DB`, falling back to `./users.json`.
    pub fn from_env() -> Self {
        let path = std::env::var(USERS_DB_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USERS_DB.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<StoreLock> {
        if let Some(parent) = non_empty_parent(&self.lock_path) {
            std::fs::create_dir_all(parent).map_err(|e| CredentialError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| CredentialError::io(&self.lock_path, e))?;
        file.lock_exclusive().map_err(|source| CredentialError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;
        Ok(StoreLock { file })
    }

    fn load(&self) -> Result<UserTable> {
        if !self.path.exists() {
            return Ok(UserTable {
                version: TABLE_VERSION,
                users: BTreeMap::new(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| CredentialError::io(&self.path, e))?;
        serde_json::from_str(&raw).map_err(|source| CredentialError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, table: &UserTable) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(table).map_err(|source| CredentialError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &bytes)
    }
}

impl CredentialStore for FileCredentialStore {
    fn signup(&self, email: &str, password: &str) -> Result<SignupOutcome> {
        let email = normalize(email, password)?;
        let _guard = self.lock()?;
        let mut table = self.load()?;
        if table.users.contains_key(email) {
            return Ok(SignupOutcome::AlreadyExists);
        }
        table.users.insert(email.to_string(), hash_password(password));
        table.version = TABLE_VERSION;
        self.save(&table)?;
        log::info!("Registered user ({} total)", table.users.len());
        Ok(SignupOutcome::Created)
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize(email, password)?;
        let _guard = self.lock()?;
        let table = self.load()?;
        Ok(verify(table.users.get(email), password))
    }
}

struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = non_empty_parent(path).unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| CredentialError::io(parent, e))?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("users"),
        std::process::id()
    ));

    if let Err(err) = write_tmp(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(CredentialError::io(&tmp, err));
    }
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(CredentialError::io(path, err));
    }
    Ok(())
}

fn write_tmp(tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()
}
