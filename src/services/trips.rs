use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use super::firestore::{Document, Fields, FirestoreClient, Value};
use crate::{
    error::StoreError,
    models::trip::{AuditStamp, Trip, TripDraft, TripId, TripPatch},
};

pub const TRIPS_COLLECTION: &str = "trips";

const LIST_FAILED: &str = "Nie udało się pobrać wycieczek";
const CREATE_FAILED: &str = "Nie udało się dodać wycieczki";
const UPDATE_FAILED: &str = "Nie udało się zaktualizować wycieczki";
const DELETE_FAILED: &str = "Nie udało się usunąć wycieczki";

/// Remote trip collection. Every call is one independent round trip.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// All trips, newest start date first.
    async fn list_by_start_desc(&self) -> Result<Vec<Trip>, StoreError>;
    async fn insert(&self, draft: &TripDraft, stamp: &AuditStamp) -> Result<TripId, StoreError>;
    async fn update(
        &self,
        id: &str,
        patch: &TripPatch,
        stamp: &AuditStamp,
    ) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct FirestoreTripStore {
    client: FirestoreClient,
}

impl FirestoreTripStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TripStore for FirestoreTripStore {
    async fn list_by_start_desc(&self) -> Result<Vec<Trip>, StoreError> {
        let documents = self
            .client
            .list_ordered(TRIPS_COLLECTION, "startDate", true)
            .await?;
        documents.iter().map(trip_from_document).collect()
    }

    async fn insert(&self, draft: &TripDraft, stamp: &AuditStamp) -> Result<TripId, StoreError> {
        let mut fields = patch_fields(&TripPatch::from(draft.clone()));
        fields.insert("createdAt".into(), Value::timestamp(stamp.at));
        fields.insert("createdBy".into(), Value::string(&stamp.by));
        fields.insert("updatedAt".into(), Value::timestamp(stamp.at));
        fields.insert("updatedBy".into(), Value::string(&stamp.by));
        self.client.create_document(TRIPS_COLLECTION, fields).await
    }

    async fn update(
        &self,
        id: &str,
        patch: &TripPatch,
        stamp: &AuditStamp,
    ) -> Result<(), StoreError> {
        let mut fields = patch_fields(patch);
        fields.insert("updatedAt".into(), Value::timestamp(stamp.at));
        fields.insert("updatedBy".into(), Value::string(&stamp.by));
        self.client
            .patch_document(&format!("{TRIPS_COLLECTION}/{id}"), fields)
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_document(&format!("{TRIPS_COLLECTION}/{id}"))
            .await
    }
}

/// Only the fields present in the patch; dates become timestamps.
fn patch_fields(patch: &TripPatch) -> Fields {
    let mut fields = Fields::new();
    if let Some(date) = patch.start_date {
        fields.insert("startDate".into(), Value::date(date));
    }
    if let Some(date) = patch.end_date {
        fields.insert("endDate".into(), Value::date(date));
    }
    if let Some(title) = &patch.title {
        fields.insert("title".into(), Value::string(title));
    }
    if let Some(description) = &patch.description {
        fields.insert("description".into(), Value::string(description));
    }
    if let Some(price) = patch.price {
        fields.insert("price".into(), Value::DoubleValue(price));
    }
    if let Some(url) = &patch.image_url {
        fields.insert("imageUrl".into(), Value::string(url));
    }
    if let Some(url) = &patch.thumbnail_url {
        fields.insert("thumbnailUrl".into(), Value::string(url));
    }
    if let Some(cancelled) = patch.cancelled {
        fields.insert("cancelled".into(), Value::BooleanValue(cancelled));
    }
    fields
}

fn trip_from_document(document: &Document) -> Result<Trip, StoreError> {
    let fields = &document.fields;
    let id = document
        .id()
        .ok_or_else(|| StoreError::Decode("document without name".into()))?;
    let date = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_date)
            .ok_or_else(|| StoreError::Decode(format!("trip {id}: missing {key}")))
    };
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let optional_text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(Trip {
        id: Some(id.to_string()),
        start_date: date("startDate")?,
        end_date: date("endDate")?,
        title: text("title"),
        description: text("description"),
        price: fields
            .get("price")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        image_url: text("imageUrl"),
        thumbnail_url: text("thumbnailUrl"),
        cancelled: fields
            .get("cancelled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: fields.get("createdAt").and_then(Value::as_timestamp),
        created_by: optional_text("createdBy"),
        updated_at: fields.get("updatedAt").and_then(Value::as_timestamp),
        updated_by: optional_text("updatedBy"),
    })
}

/// In-process trip collection with failure injection.
#[derive(Default)]
pub struct MemoryTripStore {
    trips: Mutex<Vec<Trip>>,
    failing: AtomicBool,
    list_delay_ms: AtomicU64,
    list_calls: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, trip: Trip) -> TripId {
        let mut trips = self.trips.lock().await;
        let id = trip
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        trips.push(Trip {
            id: Some(id.clone()),
            ..trip
        });
        id
    }

    pub async fn get(&self, id: &str) -> Option<Trip> {
        self.trips
            .lock()
            .await
            .iter()
            .find(|trip| trip.id.as_deref() == Some(id))
            .cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every listing wait before answering.
    pub fn set_list_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.list_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Inserts, updates and deletes that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "store unavailable".into(),
            });
        }
        Ok(())
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::Status {
        status: 404,
        body: format!("no trip {id}"),
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn list_by_start_desc(&self) -> Result<Vec<Trip>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_available()?;
        let mut trips = self.trips.lock().await.clone();
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(trips)
    }

    async fn insert(&self, draft: &TripDraft, stamp: &AuditStamp) -> Result<TripId, StoreError> {
        self.check_available()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut trip = draft.clone().into_trip(Some(id.clone()));
        trip.created_at = Some(stamp.at);
        trip.created_by = Some(stamp.by.clone());
        trip.updated_at = Some(stamp.at);
        trip.updated_by = Some(stamp.by.clone());
        self.trips.lock().await.push(trip);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update(
        &self,
        id: &str,
        patch: &TripPatch,
        stamp: &AuditStamp,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut trips = self.trips.lock().await;
        let trip = trips
            .iter_mut()
            .find(|trip| trip.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(id))?;
        patch.apply_to(trip);
        trip.updated_at = Some(stamp.at);
        trip.updated_by = Some(stamp.by.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut trips = self.trips.lock().await;
        let before = trips.len();
        trips.retain(|trip| trip.id.as_deref() != Some(id));
        if trips.len() == before {
            return Err(not_found(id));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub trips: Vec<Trip>,
    /// True until the first fetch has finished, whatever its outcome.
    pub loading: bool,
    pub error: Option<String>,
}

struct CatalogState {
    trips: Vec<Trip>,
    loading: bool,
    error: Option<String>,
}

/// The trip list as last fetched from the store, plus the mutations.
///
/// Every successful mutation is followed by a full re-fetch; nothing is
/// merged locally, so the list always reflects a store round trip.
/// Failures never clear the list, they only set `error`. A refresh in
/// flight never hides the list from concurrent readers: `loading` only
/// goes from true to false.
#[derive(Clone)]
pub struct TripCatalog {
    store: Arc<dyn TripStore>,
    state: Arc<RwLock<CatalogState>>,
}

impl TripCatalog {
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(CatalogState {
                trips: Vec::new(),
                loading: true,
                error: None,
            })),
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read().await;
        CatalogSnapshot {
            trips: state.trips.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Looks in the current list first, then once more after a refresh.
    pub async fn find(&self, id: &str) -> Option<Trip> {
        if let Some(trip) = self.find_loaded(id).await {
            return Some(trip);
        }
        self.refresh().await;
        self.find_loaded(id).await
    }

    async fn find_loaded(&self, id: &str) -> Option<Trip> {
        self.state
            .read()
            .await
            .trips
            .iter()
            .find(|trip| trip.id.as_deref() == Some(id))
            .cloned()
    }

    pub async fn refresh(&self) -> bool {
        let result = self.store.list_by_start_desc().await;
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(trips) => {
                state.trips = trips;
                state.error = None;
                true
            }
            Err(err) => {
                error!("fetching trips failed: {err}");
                state.error = Some(LIST_FAILED.into());
                false
            }
        }
    }

    pub async fn create(&self, draft: TripDraft, actor: &str) -> Option<TripId> {
        let stamp = AuditStamp::now(actor);
        match self.store.insert(&draft, &stamp).await {
            Ok(id) => {
                info!(%id, actor, "trip created");
                self.refresh().await;
                Some(id)
            }
            Err(err) => {
                error!("creating trip failed: {err}");
                self.set_error(CREATE_FAILED).await;
                None
            }
        }
    }

    pub async fn update(&self, id: &str, patch: TripPatch, actor: &str) -> bool {
        let stamp = AuditStamp::now(actor);
        match self.store.update(id, &patch, &stamp).await {
            Ok(()) => {
                info!(id, actor, "trip updated");
                self.refresh().await;
                true
            }
            Err(err) => {
                error!(id, "updating trip failed: {err}");
                self.set_error(UPDATE_FAILED).await;
                false
            }
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(id).await {
            Ok(()) => {
                info!(id, "trip deleted");
                self.refresh().await;
                true
            }
            Err(err) => {
                error!(id, "deleting trip failed: {err}");
                self.set_error(DELETE_FAILED).await;
                false
            }
        }
    }

    async fn set_error(&self, message: &str) {
        self.state.write().await.error = Some(message.to_string());
    }
}
