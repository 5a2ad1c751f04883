use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    auth::SessionGate,
    config::AppConfig,
    services::{images::ImageHost, trips::TripCatalog},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: SessionGate,
    pub catalog: TripCatalog,
    pub images: Arc<dyn ImageHost>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        gate: SessionGate,
        catalog: TripCatalog,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            gate,
            catalog,
            images,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
