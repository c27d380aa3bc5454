//! Authenticated session shared by API clients

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Holds the bearer token attached to every request
///
/// Clones share the same slot, so signing in or out is seen by every
/// client built from the session.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Session without a token
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session with `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.set_token(token);
        session
    }

    /// Replace the current token
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.write() = (!token.trim().is_empty()).then_some(token);
    }

    /// Forget the current token
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Current token, if signed in
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Whether a token is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_token() {
        let session = Session::anonymous();
        let clone = session.clone();

        session.set_token("abc");
        assert_eq!(clone.token().as_deref(), Some("abc"));

        clone.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_blank_token_signs_out() {
        let session = Session::with_token("abc");
        session.set_token("  ");
        assert!(session.token().is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::with_token("very-secret");
        assert!(!format!("{session:?}").contains("very-secret"));
    }
}
