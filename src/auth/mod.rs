//! Signup, login and logout against the user store.

mod password;
mod session;

pub use password::{Verification, hash_password, secrets_match, verify_password};
pub use session::{Role, Session, SessionStore};

use crate::{
    error::AppError,
    store::{Store, UserRecord},
};

/// What happened to a request for admin access during signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    NotRequested,
    Granted,
    /// Wrong passkey. The account is still created, as a regular user.
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub username: String,
    pub admin: AdminRequest,
}

/// Register a new account. Admin status is granted only when it was asked
/// for and `passkey` equals `admin_passkey` exactly.
pub async fn signup(
    store: &Store,
    username: &str,
    password: &str,
    apply_admin: bool,
    passkey: &str,
    admin_passkey: &str,
) -> Result<SignupOutcome, AppError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::IncompleteForm);
    }

    // Cheap pre-check so a taken name does not pay for hashing.
    // insert_user re-checks under the store lock.
    if store.load_users().await?.contains_key(username) {
        return Err(AppError::DuplicateUser);
    }

    let admin = match (apply_admin, secrets_match(passkey, admin_passkey)) {
        (false, _) => AdminRequest::NotRequested,
        (true, true) => AdminRequest::Granted,
        (true, false) => AdminRequest::Denied,
    };

    let record = UserRecord {
        password: hash_password(password)?,
        is_admin: admin == AdminRequest::Granted,
    };
    store.insert_user(username, record).await?;

    tracing::info!(username, admin = ?admin, "Registered user");
    Ok(SignupOutcome {
        username: username.to_string(),
        admin,
    })
}

/// Verify credentials, bump the login counter and open a session.
/// Returns the session token alongside the session.
pub async fn login(
    store: &Store,
    sessions: &SessionStore,
    username: &str,
    password: &str,
) -> Result<(String, Session), AppError> {
    let users = store.load_users().await?;
    let record = users.get(username).ok_or(AppError::InvalidCredentials)?;

    match verify_password(password, &record.password) {
        Verification::Valid => {}
        Verification::ValidLegacy => {
            store
                .replace_password(username, hash_password(password)?)
                .await?;
            tracing::info!(username, "Upgraded cleartext password to argon2");
        }
        Verification::Invalid => {
            tracing::info!(username, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }
    }

    let logins = store.increment_login_count().await?;
    let session = Session {
        username: username.to_string(),
        is_admin: record.is_admin,
    };
    let token = sessions.insert(session.clone()).await;

    tracing::info!(username, role = %session.role(), logins, "Login");
    Ok((token, session))
}

/// End a session. Unknown tokens are ignored.
pub async fn logout(sessions: &SessionStore, token: &str) {
    if let Some(session) = sessions.remove(token).await {
        tracing::info!(username = %session.username, "Logout");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSKEY: &str = "12345678";

    async fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_signup_adds_exactly_one_user() {
        let (_dir, store) = temp_store().await;
        signup(&store, "ada", "pw", false, "", PASSKEY).await.unwrap();
        let outcome = signup(&store, "bob", "pw", false, "", PASSKEY).await.unwrap();
        assert_eq!(outcome.admin, AdminRequest::NotRequested);

        let users = store.load_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(!users["bob"].is_admin);
        assert_ne!(users["bob"].password, "pw");
    }

    #[tokio::test]
    async fn test_signup_admin_matrix() {
        let (_dir, store) = temp_store().await;
        let cases = [
            ("a", true, PASSKEY, AdminRequest::Granted, true),
            ("b", true, "87654321", AdminRequest::Denied, false),
            ("c", true, "", AdminRequest::Denied, false),
            ("d", false, PASSKEY, AdminRequest::NotRequested, false),
        ];
        for (name, apply, passkey, expected, is_admin) in cases {
            let outcome = signup(&store, name, "pw", apply, passkey, PASSKEY)
                .await
                .unwrap();
            assert_eq!(outcome.admin, expected, "user {name}");
            assert_eq!(store.load_users().await.unwrap()[name].is_admin, is_admin);
        }
    }

    #[tokio::test]
    async fn test_signup_duplicate_and_incomplete() {
        let (_dir, store) = temp_store().await;
        signup(&store, "ada", "pw", false, "", PASSKEY).await.unwrap();
        assert!(matches!(
            signup(&store, "ada", "other", true, PASSKEY, PASSKEY).await,
            Err(AppError::DuplicateUser)
        ));
        assert!(matches!(
            signup(&store, "  ", "pw", false, "", PASSKEY).await,
            Err(AppError::IncompleteForm)
        ));
        assert!(matches!(
            signup(&store, "eve", "", false, "", PASSKEY).await,
            Err(AppError::IncompleteForm)
        ));
        let users = store.load_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users["ada"].is_admin);
    }

    #[tokio::test]
    async fn test_login_success_counts_and_opens_session() {
        let (_dir, store) = temp_store().await;
        let sessions = SessionStore::default();
        signup(&store, "root", "pw", true, PASSKEY, PASSKEY)
            .await
            .unwrap();

        let (token, session) = login(&store, &sessions, "root", "pw").await.unwrap();
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(sessions.get(&token).await, Some(session));
        assert_eq!(store.login_count().await.unwrap(), 1);

        logout(&sessions, &token).await;
        assert_eq!(sessions.get(&token).await, None);
    }

    #[tokio::test]
    async fn test_login_failure_leaves_counter() {
        let (_dir, store) = temp_store().await;
        let sessions = SessionStore::default();
        signup(&store, "ada", "pw", false, "", PASSKEY).await.unwrap();

        assert!(matches!(
            login(&store, &sessions, "ada", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, &sessions, "nobody", "pw").await,
            Err(AppError::InvalidCredentials)
        ));
        assert_eq!(store.login_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login_upgrades_legacy_password() {
        let (_dir, store) = temp_store().await;
        let sessions = SessionStore::default();
        store
            .insert_user(
                "old",
                UserRecord {
                    password: "plain".to_string(),
                    is_admin: false,
                },
            )
            .await
            .unwrap();

        login(&store, &sessions, "old", "plain").await.unwrap();
        let stored = store.load_users().await.unwrap()["old"].password.clone();
        assert!(stored.starts_with("$argon2"));

        login(&store, &sessions, "old", "plain").await.unwrap();
        assert_eq!(store.login_count().await.unwrap(), 2);
    }
}
