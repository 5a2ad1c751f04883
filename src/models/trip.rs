use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TripId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Option<TripId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub cancelled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl Trip {
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

/// A trip as entered by a user: no identifier, no audit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDraft {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub thumbnail_url: String,
    pub cancelled: bool,
}

impl TripDraft {
    pub fn into_trip(self, id: Option<TripId>) -> Trip {
        Trip {
            id,
            start_date: self.start_date,
            end_date: self.end_date,
            title: self.title,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            thumbnail_url: self.thumbnail_url,
            cancelled: self.cancelled,
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// Partial update. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub cancelled: Option<bool>,
}

impl TripPatch {
    pub fn cancelled(value: bool) -> Self {
        Self {
            cancelled: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, trip: &mut Trip) {
        if let Some(value) = self.start_date {
            trip.start_date = value;
        }
        if let Some(value) = self.end_date {
            trip.end_date = value;
        }
        if let Some(value) = &self.title {
            trip.title = value.clone();
        }
        if let Some(value) = &self.description {
            trip.description = value.clone();
        }
        if let Some(value) = self.price {
            trip.price = value;
        }
        if let Some(value) = &self.image_url {
            trip.image_url = value.clone();
        }
        if let Some(value) = &self.thumbnail_url {
            trip.thumbnail_url = value.clone();
        }
        if let Some(value) = self.cancelled {
            trip.cancelled = value;
        }
    }
}

impl From<TripDraft> for TripPatch {
    fn from(draft: TripDraft) -> Self {
        Self {
            start_date: Some(draft.start_date),
            end_date: Some(draft.end_date),
            title: Some(draft.title),
            description: Some(draft.description),
            price: Some(draft.price),
            image_url: Some(draft.image_url),
            thumbnail_url: Some(draft.thumbnail_url),
            cancelled: Some(draft.cancelled),
        }
    }
}

/// Who changed a record and when. Stamped by the catalog, never by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub at: DateTime<Utc>,
    pub by: String,
}

impl AuditStamp {
    pub fn now(by: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            by: by.into(),
        }
    }
}
