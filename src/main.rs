use std::sync::Arc;

use listravel::auth::SessionGate;
use listravel::config::{AppConfig, Backend};
use listravel::error::AppError;
use listravel::routes::create_router;
use listravel::services::{
    allow_list::{AllowListStore, FirestoreAllowList, MemoryAllowList},
    firestore::FirestoreClient,
    identity::{FirebaseIdentity, IdentityProvider, MemoryIdentity},
    images::{CloudinaryHost, ImageHost, MemoryImageHost},
    trips::{FirestoreTripStore, MemoryTripStore, TripCatalog, TripStore},
};
use listravel::state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};

struct Backends {
    identity: Arc<dyn IdentityProvider>,
    allow_list: Arc<dyn AllowListStore>,
    trips: Arc<dyn TripStore>,
    images: Arc<dyn ImageHost>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let backends = build_backends(&config)?;

    let gate = SessionGate::new(backends.identity, backends.allow_list);
    let catalog = TripCatalog::new(backends.trips);
    let state = AppState::new(config.clone(), gate, catalog, backends.images);

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn build_backends(config: &AppConfig) -> Result<Backends, AppError> {
    match config.backend {
        Backend::Remote => {
            let (Some(firebase), Some(cloudinary)) = (&config.firebase, &config.cloudinary) else {
                return Err(AppError::Config(
                    "remote backend needs Firebase and Cloudinary settings".into(),
                ));
            };
            let http = reqwest::Client::builder()
                .user_agent(concat!("listravel/", env!("CARGO_PKG_VERSION")))
                .build()?;
            let firestore = FirestoreClient::new(http.clone(), firebase);
            info!(project = %firebase.project_id, "using Firebase and Cloudinary");
            Ok(Backends {
                identity: Arc::new(FirebaseIdentity::new(http.clone(), firebase.api_key.clone())),
                allow_list: Arc::new(FirestoreAllowList::new(firestore.clone())),
                trips: Arc::new(FirestoreTripStore::new(firestore)),
                images: Arc::new(CloudinaryHost::new(http, cloudinary)),
            })
        }
        Backend::Memory => {
            if config.allowed_emails.is_empty() {
                warn!("in-memory backend without ALLOWED_EMAILS: nobody can sign in");
            }
            let identity = config
                .allowed_emails
                .iter()
                .fold(MemoryIdentity::new(), |identity, email| {
                    identity.with_account(email, &config.dev_password, None)
                });
            info!(
                accounts = config.allowed_emails.len(),
                "using in-memory backend"
            );
            Ok(Backends {
                identity: Arc::new(identity),
                allow_list: Arc::new(MemoryAllowList::new(config.allowed_emails.clone())),
                trips: Arc::new(MemoryTripStore::new()),
                images: Arc::new(MemoryImageHost::new()),
            })
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,listravel=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
