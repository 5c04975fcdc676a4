//! Identity provider integration
//!
//! The assistant subscribes to a stream of authentication state
//! changes and gates persistence and voice features on it. Guests can
//! browse and select recipes; voice control and saved sessions require
//! a signed-in user.

use tokio::sync::watch;

/// Current authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
}

impl AuthState {
    /// Browsing as a guest
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    /// Signed in as the given user
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
            display_name,
        }
    }
}

/// A source of authentication state change events
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to the state stream; the receiver always holds the
    /// latest state
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    /// Current state
    fn current(&self) -> AuthState;
}

/// Identity provider backed by local configuration
///
/// Stands in for a remote identity service: the signed-in user comes
/// from config, and sign-in/sign-out events can be injected at
/// runtime (and by tests).
pub struct LocalIdentity {
    tx: watch::Sender<AuthState>,
}

impl LocalIdentity {
    /// Create a provider with the given initial state
    #[must_use]
    pub fn new(initial: AuthState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a signed-in state
    pub fn sign_in(&self, user_id: impl Into<String>, display_name: Option<String>) {
        let state = AuthState::signed_in(user_id, display_name);
        tracing::info!(user = ?state.user_id, "user signed in");
        self.tx.send_replace(state);
    }

    /// Publish a guest state
    pub fn sign_out(&self) {
        tracing::info!("user signed out");
        self.tx.send_replace(AuthState::guest());
    }
}

impl IdentityProvider for LocalIdentity {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_default() {
        let provider = LocalIdentity::new(AuthState::guest());
        assert!(!provider.current().authenticated);
    }

    #[test]
    fn test_sign_in_and_out() {
        let provider = LocalIdentity::new(AuthState::guest());
        let rx = provider.subscribe();

        provider.sign_in("u-1", Some("Asha".to_string()));
        assert!(rx.borrow().authenticated);
        assert_eq!(rx.borrow().user_id.as_deref(), Some("u-1"));

        provider.sign_out();
        assert!(!rx.borrow().authenticated);
        assert!(rx.borrow().user_id.is_none());
    }
}
