use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use tracing::{info, warn};

use crate::{
    error::{AppError, LoginError},
    models::{
        session::SessionState,
        user::{AuthenticatedUser, Credentials, ProviderUser},
    },
    services::{
        allow_list::{is_authorized, AllowListStore},
        identity::IdentityProvider,
    },
    state::AppState,
};

pub const SESSION_COOKIE: &str = "listravel_session";

/// Sign-in, session restoration and sign-out, all behind the allow-list.
///
/// Built once at startup and shared through [`AppState`].
#[derive(Clone)]
pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    allow_list: Arc<dyn AllowListStore>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, allow_list: Arc<dyn AllowListStore>) -> Self {
        Self {
            provider,
            allow_list,
        }
    }

    /// A provider sign-in event: either a restored session or nobody.
    pub async fn restore(&self, user: Option<ProviderUser>) -> SessionState {
        let state = SessionState::Resolving;
        let Some(user) = user else {
            return state.resolve(None);
        };
        match self.admit(user).await {
            Some(user) => state.resolve(Some(user)),
            None => state.resolve(None),
        }
    }

    /// Interactive sign-in, followed by the same gate as [`Self::restore`].
    pub async fn login(&self, credentials: &Credentials) -> Result<ProviderUser, LoginError> {
        let user = match self.provider.sign_in(credentials).await {
            Ok(user) => user,
            Err(err) => {
                warn!(email = %credentials.email, "sign-in failed: {err}");
                return Err(LoginError::Provider);
            }
        };
        match self.admit(user.clone()).await {
            Some(admitted) => {
                info!(email = %admitted.email, "signed in");
                Ok(user)
            }
            None => Err(LoginError::Denied),
        }
    }

    /// Errors are logged and swallowed.
    pub async fn logout(&self, user: &AuthenticatedUser) {
        if let Err(err) = self.provider.sign_out(&user.uid).await {
            warn!(email = %user.email, "sign-out failed: {err}");
        } else {
            info!(email = %user.email, "signed out");
        }
    }

    /// Authorized users come back as [`AuthenticatedUser`]; anybody else
    /// is signed out of the provider.
    async fn admit(&self, user: ProviderUser) -> Option<AuthenticatedUser> {
        if is_authorized(self.allow_list.as_ref(), user.email.as_deref()).await {
            return AuthenticatedUser::from_provider(user);
        }
        warn!(email = ?user.email, "not on the allow-list, forcing sign-out");
        if let Err(err) = self.provider.sign_out(&user.uid).await {
            warn!("forced sign-out failed: {err}");
        }
        None
    }
}

pub fn session_cookie(user: &ProviderUser) -> Result<Cookie<'static>, AppError> {
    let payload = serde_json::to_string(user).map_err(|err| AppError::Other(err.into()))?;
    Ok(Cookie::build((SESSION_COOKIE, payload))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build())
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let restored = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| serde_json::from_str::<ProviderUser>(cookie.value()).ok());
        let session = state.gate.restore(restored).await;
        Ok(Self(session.into_user()))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}
