//! Flat-file persistence: users, candidates and the login counter live in
//! JSON documents under the data directory, resumes in `resumes/`.
//!
//! Saves overwrite the target in place. Read-modify-write sequences are
//! serialized within this process only; separate processes sharing the same
//! directory race with last-writer-wins semantics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

use crate::error::AppError;

const USERS_FILE: &str = "users.json";
const CANDIDATES_FILE: &str = "candidates.json";
const LOGIN_COUNT_FILE: &str = "login_count.json";
const RESUME_DIR: &str = "resumes";

/// A stored account. `password` is an argon2 PHC string, or cleartext for
/// records written before hashing was introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub type Users = BTreeMap<String, UserRecord>;

/// A submitted candidate. Field names on disk are the form labels.
///
/// Records edited by hand or written by older versions may hold numbers,
/// booleans or `null` where a string is expected; those are read as text so
/// one odd record never hides the rest of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    #[serde(rename = "Full Name", deserialize_with = "text")]
    pub full_name: String,
    #[serde(rename = "Email", deserialize_with = "text")]
    pub email: String,
    #[serde(rename = "Phone", deserialize_with = "text")]
    pub phone: String,
    #[serde(rename = "Experience", deserialize_with = "text")]
    pub experience: String,
    #[serde(rename = "Position", deserialize_with = "text")]
    pub position: String,
    #[serde(rename = "Location", deserialize_with = "text")]
    pub location: String,
    #[serde(rename = "Tech Stack", deserialize_with = "text")]
    pub tech_stack: String,
    #[serde(
        rename = "Resume",
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_path: Option<String>,
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        // Older records may hold the tech stack as a list; flatten it.
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(d)?))
}

fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        value => Some(value_to_text(value)),
    })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LoginCounter {
    #[serde(default)]
    logins: u64,
}

#[derive(Clone)]
pub struct Store {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Open the store rooted at `root`, creating it and the resume directory.
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(RESUME_DIR)).await?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resume_dir(&self) -> PathBuf {
        self.root.join(RESUME_DIR)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    // ── Users ────────────────────────────────────────────────────────────────

    /// Load all users. A missing file is an empty map; a malformed one is an
    /// error, since saving over it would drop every account.
    pub async fn load_users(&self) -> Result<Users, AppError> {
        let path = self.path(USERS_FILE);
        let Some(raw) = read_optional(&path).await? else {
            return Ok(Users::new());
        };
        if raw.trim().is_empty() {
            return Ok(Users::new());
        }
        serde_json::from_str(&raw).map_err(|source| AppError::MalformedData { path, source })
    }

    pub async fn save_users(&self, users: &Users) -> Result<(), AppError> {
        let body = serde_json::to_string_pretty(users)?;
        tokio::fs::write(self.path(USERS_FILE), body).await?;
        Ok(())
    }

    /// Add a user, failing with `DuplicateUser` if the name is taken.
    pub async fn insert_user(&self, username: &str, record: UserRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.load_users().await?;
        if users.contains_key(username) {
            return Err(AppError::DuplicateUser);
        }
        users.insert(username.to_string(), record);
        self.save_users(&users).await
    }

    /// Replace the stored password of an existing user. Unknown users are
    /// left alone.
    pub async fn replace_password(&self, username: &str, password: String) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.load_users().await?;
        let Some(record) = users.get_mut(username) else {
            return Ok(());
        };
        record.password = password;
        self.save_users(&users).await
    }

    // ── Candidates ───────────────────────────────────────────────────────────

    /// Load all candidates in submission order. Missing, empty or
    /// unparsable files read as an empty list.
    pub async fn load_candidates(&self) -> Result<Vec<Candidate>, AppError> {
        let path = self.path(CANDIDATES_FILE);
        let Some(raw) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(candidates) => Ok(candidates),
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    /// Append a candidate and return the new total. No de-duplication.
    pub async fn append_candidate(&self, candidate: Candidate) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut candidates = self.load_candidates().await?;
        candidates.push(candidate);
        let body = serde_json::to_string_pretty(&candidates)?;
        tokio::fs::write(self.path(CANDIDATES_FILE), body).await?;
        Ok(candidates.len())
    }

    // ── Login counter ────────────────────────────────────────────────────────

    pub async fn login_count(&self) -> Result<u64, AppError> {
        let path = self.path(LOGIN_COUNT_FILE);
        let Some(raw) = read_optional(&path).await? else {
            return Ok(0);
        };
        match serde_json::from_str::<LoginCounter>(&raw) {
            Ok(counter) => Ok(counter.logins),
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Ok(0)
            }
        }
    }

    /// Bump the counter and return the new value.
    pub async fn increment_login_count(&self) -> Result<u64, AppError> {
        let _guard = self.write_lock.lock().await;
        let counter = LoginCounter {
            logins: self.login_count().await? + 1,
        };
        tokio::fs::write(self.path(LOGIN_COUNT_FILE), serde_json::to_string(&counter)?).await?;
        Ok(counter.logins)
    }

    // ── Resumes ──────────────────────────────────────────────────────────────

    /// Write a resume under its original file name, overwriting any earlier
    /// upload with the same name.
    pub async fn save_resume(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let name = resume_file_name(file_name)
            .ok_or_else(|| AppError::UnsupportedResume(file_name.to_string()))?;
        let path = self.resume_dir().join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Locate a stored resume by file name.
    pub async fn open_resume(&self, file_name: &str) -> Result<Option<PathBuf>, AppError> {
        let Some(name) = resume_file_name(file_name) else {
            return Ok(None);
        };
        let path = self.resume_dir().join(name);
        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

/// Reduce an uploaded file name to its final component so it cannot leave
/// the resume directory. Browsers on Windows may send a full path.
pub fn resume_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

async fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
