use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::AppError,
    models::user::{Credentials, ProviderUser},
};

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderUser, AppError>;
    async fn sign_out(&self, uid: &str) -> Result<(), AppError>;
}

/// Firebase Authentication through the Identity Toolkit REST API.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: Client,
    api_key: Arc<String>,
}

impl FirebaseIdentity {
    pub fn new(http: Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: Arc::new(api_key.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderUser, AppError> {
        let response = self
            .http
            .post(SIGN_IN_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AppError::Other(anyhow!(
                "identity provider responded with {status}"
            )));
        }

        let body = response.json::<SignInResponse>().await?;
        Ok(ProviderUser {
            uid: body.local_id,
            email: body.email,
            display_name: body.display_name.filter(|name| !name.is_empty()),
            id_token: body.id_token,
        })
    }

    async fn sign_out(&self, uid: &str) -> Result<(), AppError> {
        // Tokens are stateless; dropping the session cookie is the sign-out.
        debug!(uid, "firebase sign-out");
        Ok(())
    }
}

#[derive(Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
    display_name: Option<String>,
}

/// In-process accounts keyed by lower-cased email.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: HashMap<String, Account>,
    unavailable: AtomicBool,
    failing_sign_out: AtomicBool,
    sign_outs: AtomicUsize,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(
        mut self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Self {
        let account = Account {
            uid: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.map(str::to_string),
        };
        self.accounts.insert(email.to_lowercase(), account);
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_failing_sign_out(&self, failing: bool) {
        self.failing_sign_out.store(failing, Ordering::SeqCst);
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<ProviderUser, AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Other(anyhow!("identity provider unavailable")));
        }
        let account = self
            .accounts
            .get(&credentials.email.trim().to_lowercase())
            .filter(|account| account.password == credentials.password)
            .ok_or(AppError::Unauthorized)?;
        Ok(ProviderUser {
            uid: account.uid.clone(),
            email: Some(account.email.clone()),
            display_name: account.display_name.clone(),
            id_token: None,
        })
    }

    async fn sign_out(&self, uid: &str) -> Result<(), AppError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.failing_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::Other(anyhow!("sign-out failed for {uid}")));
        }
        Ok(())
    }
}
