use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::firestore::FirestoreClient;
use crate::error::StoreError;

pub const ALLOW_LIST_DOCUMENT: &str = "config/authorizedUsers";

/// Read-only view of the allow-list document.
#[async_trait]
pub trait AllowListStore: Send + Sync {
    /// `Ok(None)` when the document does not exist.
    async fn allowed_emails(&self) -> Result<Option<Vec<String>>, StoreError>;
}

/// Fails closed: a missing email, a missing document or an unreadable
/// store all mean "not authorized".
pub async fn is_authorized(store: &dyn AllowListStore, email: Option<&str>) -> bool {
    let Some(email) = email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
    else {
        return false;
    };

    match store.allowed_emails().await {
        Ok(Some(emails)) => {
            let allowed = emails
                .iter()
                .any(|entry| entry.trim().to_lowercase() == email);
            debug!(%email, allowed, "allow-list checked");
            allowed
        }
        Ok(None) => {
            warn!("allow-list document {ALLOW_LIST_DOCUMENT} does not exist");
            false
        }
        Err(err) => {
            warn!("allow-list lookup failed: {err}");
            false
        }
    }
}

#[derive(Clone)]
pub struct FirestoreAllowList {
    client: FirestoreClient,
}

impl FirestoreAllowList {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AllowListStore for FirestoreAllowList {
    async fn allowed_emails(&self) -> Result<Option<Vec<String>>, StoreError> {
        let Some(document) = self.client.get_document(ALLOW_LIST_DOCUMENT).await? else {
            return Ok(None);
        };
        let emails = document
            .fields
            .get("emails")
            .and_then(|value| value.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| value.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(emails))
    }
}

#[derive(Default)]
pub struct MemoryAllowList {
    emails: RwLock<Option<Vec<String>>>,
    failing: AtomicBool,
}

impl MemoryAllowList {
    pub fn new(emails: Vec<String>) -> Self {
        Self {
            emails: RwLock::new(Some(emails)),
            failing: AtomicBool::new(false),
        }
    }

    /// An allow-list whose backing document does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    pub async fn set_emails(&self, emails: Option<Vec<String>>) {
        *self.emails.write().await = emails;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AllowListStore for MemoryAllowList {
    async fn allowed_emails(&self) -> Result<Option<Vec<String>>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "allow-list unavailable".into(),
            });
        }
        Ok(self.emails.read().await.clone())
    }
}
