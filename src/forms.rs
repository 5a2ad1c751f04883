use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::{
    error::{FormError, ImageSlot, UploadError},
    models::trip::{Trip, TripDraft, TripId, TripPatch},
    services::{
        images::{ImageHost, ImageUpload, THUMBNAIL_FOLDER, TRIP_FOLDER},
        trips::TripCatalog,
    },
};

/// What the receiving side did with a submitted draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Created(TripId),
    Accepted,
    Rejected,
}

impl SubmitResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmitResult::Rejected)
    }
}

/// Where a finished form goes.
#[async_trait]
pub trait TripSubmitter: Send + Sync {
    async fn submit(&self, draft: TripDraft) -> SubmitResult;
}

pub struct CreateTrip<'a> {
    pub catalog: &'a TripCatalog,
    pub actor: &'a str,
}

#[async_trait]
impl TripSubmitter for CreateTrip<'_> {
    async fn submit(&self, draft: TripDraft) -> SubmitResult {
        match self.catalog.create(draft, self.actor).await {
            Some(id) => SubmitResult::Created(id),
            None => SubmitResult::Rejected,
        }
    }
}

pub struct UpdateTrip<'a> {
    pub catalog: &'a TripCatalog,
    pub id: &'a str,
    pub actor: &'a str,
}

#[async_trait]
impl TripSubmitter for UpdateTrip<'_> {
    async fn submit(&self, draft: TripDraft) -> SubmitResult {
        if self
            .catalog
            .update(self.id, TripPatch::from(draft), self.actor)
            .await
        {
            SubmitResult::Accepted
        } else {
            SubmitResult::Rejected
        }
    }
}

/// Fields that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFields {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
}

/// Create/edit form state. Dates and price are kept as typed so the form
/// can be re-rendered exactly as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripForm {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub price: String,
    pub cancelled: bool,
    pub existing_image_url: String,
    pub existing_thumbnail_url: String,
    pub main_image: Option<ImageUpload>,
    pub thumbnail: Option<ImageUpload>,
}

impl TripForm {
    pub fn for_trip(trip: &Trip) -> Self {
        Self {
            title: trip.title.clone(),
            description: trip.description.clone(),
            start_date: trip.start_date.format("%Y-%m-%d").to_string(),
            end_date: trip.end_date.format("%Y-%m-%d").to_string(),
            price: trip.price.to_string(),
            cancelled: trip.cancelled,
            existing_image_url: trip.image_url.clone(),
            existing_thumbnail_url: trip.thumbnail_url.clone(),
            main_image: None,
            thumbnail: None,
        }
    }

    /// Picking a file only stages it; nothing is uploaded until submit.
    pub fn select_image(&mut self, slot: ImageSlot, image: ImageUpload) {
        match slot {
            ImageSlot::Main => self.main_image = Some(image),
            ImageSlot::Thumbnail => self.thumbnail = Some(image),
        }
    }

    pub fn pending(&self, slot: ImageSlot) -> Option<&ImageUpload> {
        match slot {
            ImageSlot::Main => self.main_image.as_ref(),
            ImageSlot::Thumbnail => self.thumbnail.as_ref(),
        }
    }

    /// Staged image as a local `data:` URL, else the hosted one.
    pub fn preview_url(&self, slot: ImageSlot) -> Option<String> {
        let existing = match slot {
            ImageSlot::Main => &self.existing_image_url,
            ImageSlot::Thumbnail => &self.existing_thumbnail_url,
        };
        match self.pending(slot) {
            Some(image) => Some(image.data_url()),
            None if !existing.is_empty() => Some(existing.clone()),
            None => None,
        }
    }

    /// The inline message under the date fields, if any.
    pub fn date_range_error(&self) -> Option<FormError> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        (end < start).then_some(FormError::InvalidDateRange)
    }

    pub fn can_submit(&self) -> bool {
        self.date_range_error().is_none()
    }

    /// The one validation pass, run for inline feedback and before submit.
    pub fn validate(&self) -> Result<ValidFields, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::MissingField("Tytuł"));
        }
        let start_date = required_date(&self.start_date, "Data rozpoczęcia")?;
        let end_date = required_date(&self.end_date, "Data zakończenia")?;
        if end_date < start_date {
            return Err(FormError::InvalidDateRange);
        }
        let price = parse_price(&self.price)?;
        Ok(ValidFields {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            start_date,
            end_date,
            price,
        })
    }

    /// The in-progress data as a trip, for the preview card.
    pub fn preview(&self) -> Result<Trip, FormError> {
        let fields = self.validate()?;
        Ok(TripDraft {
            start_date: fields.start_date,
            end_date: fields.end_date,
            title: fields.title,
            description: fields.description,
            price: fields.price,
            image_url: self.preview_url(ImageSlot::Main).unwrap_or_default(),
            thumbnail_url: self.preview_url(ImageSlot::Thumbnail).unwrap_or_default(),
            cancelled: self.cancelled,
        }
        .into_trip(None))
    }

    /// Validates, uploads staged images in parallel, checks both images
    /// are present and hands the draft to `submitter`. Validation
    /// failures return before anything remote is touched. The form is
    /// cleared unless the submitter rejects the draft.
    pub async fn submit<S>(
        &mut self,
        host: &dyn ImageHost,
        submitter: &S,
    ) -> Result<SubmitResult, FormError>
    where
        S: TripSubmitter + ?Sized,
    {
        let fields = self.validate()?;

        let (image_url, thumbnail_url) = tokio::try_join!(
            upload_or_keep(
                host,
                self.main_image.as_ref(),
                TRIP_FOLDER,
                &self.existing_image_url
            ),
            upload_or_keep(
                host,
                self.thumbnail.as_ref(),
                THUMBNAIL_FOLDER,
                &self.existing_thumbnail_url
            ),
        )?;

        if image_url.is_empty() {
            return Err(FormError::MissingRequiredImage(ImageSlot::Main));
        }
        if thumbnail_url.is_empty() {
            return Err(FormError::MissingRequiredImage(ImageSlot::Thumbnail));
        }

        let draft = TripDraft {
            start_date: fields.start_date,
            end_date: fields.end_date,
            title: fields.title,
            description: fields.description,
            price: fields.price,
            image_url,
            thumbnail_url,
            cancelled: self.cancelled,
        };

        let result = submitter.submit(draft).await;
        debug!(?result, "trip form submitted");
        if !result.is_rejected() {
            self.reset();
        }
        Ok(result)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

async fn upload_or_keep(
    host: &dyn ImageHost,
    staged: Option<&ImageUpload>,
    folder: &str,
    existing: &str,
) -> Result<String, UploadError> {
    match staged {
        Some(image) => Ok(host.upload(image, Some(folder)).await?.secure_url),
        None => Ok(existing.to_string()),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn required_date(raw: &str, field: &'static str) -> Result<NaiveDate, FormError> {
    if raw.trim().is_empty() {
        return Err(FormError::MissingField(field));
    }
    parse_date(raw).ok_or(FormError::InvalidDate(field))
}

fn parse_price(raw: &str) -> Result<f64, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FormError::MissingField("Cena"));
    }
    let price = raw
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| FormError::InvalidPrice)?;
    if !price.is_finite() || price < 0.0 {
        return Err(FormError::InvalidPrice);
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TripForm {
        TripForm {
            title: "Rzym".into(),
            description: "Wiosna w Rzymie".into(),
            start_date: "2025-06-01".into(),
            end_date: "2025-06-05".into(),
            price: "2499,90".into(),
            ..TripForm::default()
        }
    }

    #[test]
    fn accepts_comma_prices() {
        let fields = filled().validate().unwrap();
        assert_eq!(fields.price, 2499.9);
        assert_eq!(fields.title, "Rzym");
    }

    #[test]
    fn range_error_only_when_both_dates_are_set() {
        let mut form = filled();
        form.end_date = String::new();
        assert!(form.date_range_error().is_none());
        form.end_date = "2025-05-30".into();
        assert!(matches!(
            form.date_range_error(),
            Some(FormError::InvalidDateRange)
        ));
        assert!(!form.can_submit());
    }

    #[test]
    fn rejects_negative_prices() {
        let mut form = filled();
        form.price = "-1".into();
        assert!(matches!(form.validate(), Err(FormError::InvalidPrice)));
    }
}
