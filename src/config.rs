use std::{env, net::SocketAddr};

use crate::error::AppError;

/// Which collaborators the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Firebase Auth, Cloud Firestore and Cloudinary.
    Remote,
    /// Everything in process; for local development and tests.
    Memory,
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub backend: Backend,
    pub firebase: Option<FirebaseConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
    pub allowed_emails: Vec<String>,
    pub dev_password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-listravel-cookie-secret".to_string());

        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "remote".to_string())
            .as_str()
        {
            "remote" => Backend::Remote,
            "memory" => Backend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "invalid STORAGE_BACKEND: {other} (expected remote or memory)"
                )))
            }
        };

        let firebase = match (env::var("FIREBASE_API_KEY"), env::var("FIREBASE_PROJECT_ID")) {
            (Ok(api_key), Ok(project_id)) => Some(FirebaseConfig {
                api_key,
                project_id,
                bearer_token: env::var("FIRESTORE_BEARER_TOKEN").ok(),
            }),
            _ => None,
        };

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_UPLOAD_PRESET"),
        ) {
            (Ok(cloud_name), Ok(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
            }),
            _ => None,
        };

        if backend == Backend::Remote {
            if firebase.is_none() {
                return Err(AppError::Config(
                    "FIREBASE_API_KEY and FIREBASE_PROJECT_ID are required for the remote backend"
                        .into(),
                ));
            }
            if cloudinary.is_none() {
                return Err(AppError::Config(
                    "CLOUDINARY_CLOUD_NAME and CLOUDINARY_UPLOAD_PRESET are required for the remote backend"
                        .into(),
                ));
            }
        }

        let allowed_emails = env::var("ALLOWED_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        let dev_password = env::var("DEV_PASSWORD").unwrap_or_else(|_| "dev".to_string());

        Ok(Self {
            listen_addr,
            cookie_secret,
            backend,
            firebase,
            cloudinary,
            allowed_emails,
            dev_password,
        })
    }

    /// Config for the in-memory backend; used by tests.
    pub fn memory(cookie_secret: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: cookie_secret.into(),
            backend: Backend::Memory,
            firebase: None,
            cloudinary: None,
            allowed_emails: Vec::new(),
            dev_password: "dev".into(),
        }
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}
