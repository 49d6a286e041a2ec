use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Admin => f.write_str("Admin"),
        }
    }
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub is_admin: bool,
}

impl Session {
    pub fn role(&self) -> Role {
        if self.is_admin { Role::Admin } else { Role::User }
    }
}

/// In-memory session registry keyed by cookie token. Sessions do not expire;
/// they end on logout or when the process exits.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Register a session and return its fresh token.
    pub async fn insert(&self, session: Session) -> String {
        let token = new_session_token();
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }
}

fn new_session_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = SessionStore::default();
        let session = Session {
            username: "ada".to_string(),
            is_admin: false,
        };
        let token = store.insert(session.clone()).await;
        assert_eq!(token.len(), 64);
        assert_eq!(store.get(&token).await, Some(session.clone()));
        assert_eq!(store.remove(&token).await, Some(session));
        assert_eq!(store.get(&token).await, None);
    }

    #[tokio::test]
    async fn test_tokens_are_distinct() {
        let store = SessionStore::default();
        let session = Session {
            username: "ada".to_string(),
            is_admin: true,
        };
        let a = store.insert(session.clone()).await;
        let b = store.insert(session).await;
        assert_ne!(a, b);
    }

    #[test]
    fn test_role_display() {
        let admin = Session {
            username: "root".to_string(),
            is_admin: true,
        };
        assert_eq!(admin.role(), Role::Admin);
        assert_eq!(admin.role().to_string(), "Admin");
        assert_eq!(Role::User.to_string(), "User");
    }
}
