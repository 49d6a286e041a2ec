use crate::{auth::SessionStore, chat::ChatRelay, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: SessionStore,
    pub chat: ChatRelay,
    /// Shared secret that grants admin status at signup.
    pub admin_passkey: String,
}
