use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// What the identity provider hands back after sign-in. This is also the
/// payload of the encrypted session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// A provider user that passed the allow-list gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    pub fn from_provider(user: ProviderUser) -> Option<Self> {
        let email = user.email.filter(|email| !email.trim().is_empty())?;
        Some(Self {
            uid: user.uid,
            email,
            display_name: user.display_name,
        })
    }

    /// Name shown in the navigation bar.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }
}
