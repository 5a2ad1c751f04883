use super::user::AuthenticatedUser;

/// `Resolving -> SignedOut | SignedIn`, `SignedIn -> SignedOut`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Resolving,
    SignedOut,
    SignedIn(AuthenticatedUser),
}

impl SessionState {
    pub fn resolve(self, user: Option<AuthenticatedUser>) -> Self {
        match user {
            Some(user) => SessionState::SignedIn(user),
            None => SessionState::SignedOut,
        }
    }

    pub fn sign_out(self) -> Self {
        SessionState::SignedOut
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Resolving)
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<AuthenticatedUser> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}
