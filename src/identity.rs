// Identity contract consumed by the task store

/// Supplies the current user and whether they are signed in
pub trait IdentityProvider {
    fn is_authenticated(&self) -> bool;

    /// Current user id. Only meaningful when `is_authenticated()` is true.
    fn current_user_id(&self) -> String;
}

/// Fixed identity for the lifetime of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated { user_id: String },
}

impl Session {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Session::Authenticated { user_id: user_id.into() }
    }

    /// Authenticated session for a non-blank user id, anonymous otherwise
    pub fn from_user(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Session::authenticated(id),
            _ => Session::Anonymous,
        }
    }
}

impl IdentityProvider for Session {
    fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    fn current_user_id(&self) -> String {
        match self {
            Session::Authenticated { user_id } => user_id.clone(),
            Session::Anonymous => String::new(),
        }
    }
}

impl<I: IdentityProvider + ?Sized> IdentityProvider for &I {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn current_user_id(&self) -> String {
        (**self).current_user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_session() {
        let session = Session::authenticated("alice");
        assert!(session.is_authenticated());
        assert_eq!(session.current_user_id(), "alice");
    }

    #[test]
    fn test_anonymous_session() {
        let session = Session::Anonymous;
        assert!(!session.is_authenticated());
        assert_eq!(session.current_user_id(), "");
    }

    #[test]
    fn test_from_user_rejects_blank() {
        assert_eq!(Session::from_user(None), Session::Anonymous);
        assert_eq!(Session::from_user(Some("   ")), Session::Anonymous);
        assert_eq!(Session::from_user(Some(" bob ")), Session::authenticated("bob"));
    }
}
