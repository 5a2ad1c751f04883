use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::warn;

use super::NavBar;
use crate::{
    auth::CurrentUser,
    error::{AppError, FormError, ImageSlot},
    forms::{CreateTrip, SubmitResult, TripForm, TripSubmitter, UpdateTrip},
    models::{trip::Trip, user::AuthenticatedUser},
    services::images::{thumbnail_url, ImageUpload, DEFAULT_THUMBNAIL_WIDTH},
    state::AppState,
    views::{ConfirmDialog, ManagementView, PendingAction, TripCard, ViewMode},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(management))
        .route("/trips/new", get(new_form).post(new_submit))
        .route("/trips/:id/edit", get(edit_form).post(edit_submit))
        .route("/trips/:id/details", get(details))
        .route("/trips/:id/delete", get(confirm_delete).post(delete_confirmed))
        .route("/trips/:id/cancel", get(confirm_cancel).post(cancel_confirmed))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Template)]
#[template(path = "trips/index.html")]
struct ManagementTemplate {
    nav: NavBar,
    view: ManagementView,
    show_error: bool,
    error_message: String,
}

#[derive(Deserialize)]
struct ViewQuery {
    view: Option<String>,
}

async fn management(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    state.catalog.refresh().await;
    Ok(render_management(
        &state,
        NavBar::new(user),
        ViewMode::from_query(query.view.as_deref()),
        StatusCode::OK,
        None,
    )
    .await)
}

/// Callers refresh first. `action_error` wins over the catalog's own error.
async fn render_management(
    state: &AppState,
    nav: NavBar,
    mode: ViewMode,
    status: StatusCode,
    action_error: Option<String>,
) -> Response {
    let snapshot = state.catalog.snapshot().await;
    let error = action_error.or(snapshot.error);
    let template = ManagementTemplate {
        nav,
        view: ManagementView::build(&snapshot.trips, today(), mode),
        show_error: error.is_some(),
        error_message: error.unwrap_or_default(),
    };
    (status, AskamaTemplateResponse::into_response(template)).into_response()
}

#[derive(Template)]
#[template(path = "trips/form.html")]
struct TripFormTemplate {
    nav: NavBar,
    editing: bool,
    action: String,
    form: TripForm,
    show_error: bool,
    error_message: String,
    show_date_error: bool,
    date_error: String,
    date_range_message: String,
    can_submit: bool,
    main_preview: Option<String>,
    thumbnail_preview: Option<String>,
    main_pending: String,
    thumbnail_pending: String,
    preview: Option<TripCard>,
}

/// Where the form posts to and what it edits.
struct FormTarget {
    action: String,
    editing: bool,
}

impl FormTarget {
    fn create() -> Self {
        Self {
            action: "/trips/new".into(),
            editing: false,
        }
    }

    fn edit(id: &str) -> Self {
        Self {
            action: format!("/trips/{id}/edit"),
            editing: true,
        }
    }
}

fn render_form(
    nav: NavBar,
    form: TripForm,
    target: FormTarget,
    error: Option<String>,
    preview: Option<TripCard>,
    status: StatusCode,
) -> Response {
    let date_error = form.date_range_error().map(|err| err.to_string());
    let pending = |slot| {
        form.pending(slot)
            .map(ImageUpload::data_url)
            .unwrap_or_default()
    };
    let template = TripFormTemplate {
        nav,
        editing: target.editing,
        action: target.action,
        show_error: error.is_some(),
        error_message: error.unwrap_or_default(),
        show_date_error: date_error.is_some(),
        date_error: date_error.unwrap_or_default(),
        date_range_message: FormError::InvalidDateRange.to_string(),
        can_submit: form.can_submit(),
        main_preview: form.preview_url(ImageSlot::Main),
        thumbnail_preview: form.preview_url(ImageSlot::Thumbnail),
        main_pending: pending(ImageSlot::Main),
        thumbnail_pending: pending(ImageSlot::Thumbnail),
        preview,
        form,
    };
    (status, AskamaTemplateResponse::into_response(template)).into_response()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Save,
    Preview,
}

/// Reads the multipart body on top of `form`. Newly picked files win over
/// images carried along from an earlier preview.
async fn read_trip_form(
    mut multipart: Multipart,
    mut form: TripForm,
) -> Result<(TripForm, Intent), AppError> {
    let mut intent = Intent::Save;
    let mut cancelled = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "main_image" | "thumbnail" => {
                let slot = if name == "main_image" {
                    ImageSlot::Main
                } else {
                    ImageSlot::Thumbnail
                };
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.select_image(slot, ImageUpload::new(bytes.to_vec(), file_name, content_type));
                }
            }
            "main_image_pending" | "thumbnail_pending" => {
                let slot = if name == "main_image_pending" {
                    ImageSlot::Main
                } else {
                    ImageSlot::Thumbnail
                };
                let raw = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                if form.pending(slot).is_none() {
                    if let Some(image) = ImageUpload::from_data_url(&raw, format!("{name}.img")) {
                        form.select_image(slot, image);
                    }
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                match name.as_str() {
                    "title" => form.title = value,
                    "description" => form.description = value,
                    "start_date" => form.start_date = value,
                    "end_date" => form.end_date = value,
                    "price" => form.price = value,
                    "cancelled" => cancelled = true,
                    "intent" if value == "preview" => intent = Intent::Preview,
                    _ => {}
                }
            }
        }
    }

    form.cancelled = cancelled;
    Ok((form, intent))
}

async fn new_form(current: CurrentUser) -> Result<Response, AppError> {
    let user = current.require_user()?;
    Ok(render_form(
        NavBar::new(user),
        TripForm::default(),
        FormTarget::create(),
        None,
        None,
        StatusCode::OK,
    ))
}

async fn new_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let (form, intent) = read_trip_form(multipart, TripForm::default()).await?;
    let nav = NavBar::new(user);
    if intent == Intent::Preview {
        return Ok(render_preview(nav, form, FormTarget::create()));
    }
    let submitter = CreateTrip {
        catalog: &state.catalog,
        actor: &user.email,
    };
    Ok(finish_submit(&state, nav, form, FormTarget::create(), &submitter).await)
}

async fn edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = find_trip(&state, &id).await?;
    Ok(render_form(
        NavBar::new(user),
        TripForm::for_trip(&trip),
        FormTarget::edit(&id),
        None,
        None,
        StatusCode::OK,
    ))
}

async fn edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = find_trip(&state, &id).await?;
    let (form, intent) = read_trip_form(multipart, TripForm::for_trip(&trip)).await?;
    let nav = NavBar::new(user);
    if intent == Intent::Preview {
        return Ok(render_preview(nav, form, FormTarget::edit(&id)));
    }
    let submitter = UpdateTrip {
        catalog: &state.catalog,
        id: &id,
        actor: &user.email,
    };
    Ok(finish_submit(&state, nav, form, FormTarget::edit(&id), &submitter).await)
}

fn render_preview(nav: NavBar, form: TripForm, target: FormTarget) -> Response {
    match form.preview() {
        Ok(trip) => {
            let card = TripCard::new(&trip, today()).without_actions();
            render_form(nav, form, target, None, Some(card), StatusCode::OK)
        }
        Err(err) => render_form(
            nav,
            form,
            target,
            Some(err.to_string()),
            None,
            StatusCode::BAD_REQUEST,
        ),
    }
}

async fn finish_submit<S>(
    state: &AppState,
    nav: NavBar,
    mut form: TripForm,
    target: FormTarget,
    submitter: &S,
) -> Response
where
    S: TripSubmitter,
{
    match form.submit(state.images.as_ref(), submitter).await {
        Ok(SubmitResult::Rejected) => {
            let message = state
                .catalog
                .snapshot()
                .await
                .error
                .unwrap_or_else(|| "Wystąpił błąd".into());
            render_form(
                nav,
                form,
                target,
                Some(message),
                None,
                StatusCode::BAD_GATEWAY,
            )
        }
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            warn!("trip form not submitted: {err}");
            render_form(
                nav,
                form,
                target,
                Some(err.to_string()),
                None,
                StatusCode::BAD_REQUEST,
            )
        }
    }
}

async fn find_trip(state: &AppState, id: &str) -> Result<Trip, AppError> {
    state.catalog.find(id).await.ok_or(AppError::NotFound)
}

#[derive(Template)]
#[template(path = "trips/details.html")]
struct DetailsTemplate {
    nav: NavBar,
    card: TripCard,
    image_url: String,
    thumbnail_url: String,
    preview_url: String,
}

async fn details(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let trip = find_trip(&state, &id).await?;
    Ok(AskamaTemplateResponse::into_response(DetailsTemplate {
        nav: NavBar::new(user),
        card: TripCard::new(&trip, today()).without_actions(),
        preview_url: thumbnail_url(&trip.image_url, DEFAULT_THUMBNAIL_WIDTH),
        image_url: trip.image_url,
        thumbnail_url: trip.thumbnail_url,
    }))
}

#[derive(Template)]
#[template(path = "trips/confirm.html")]
struct ConfirmTemplate {
    nav: NavBar,
    dialog: ConfirmDialog,
    action: String,
    toggle: bool,
    cancelled: bool,
}

fn render_confirm(nav: NavBar, pending: &PendingAction, trip: &Trip) -> Response {
    let (toggle, cancelled) = match pending {
        PendingAction::Delete { .. } => (false, false),
        PendingAction::ToggleCancel { cancelled, .. } => (true, *cancelled),
    };
    AskamaTemplateResponse::into_response(ConfirmTemplate {
        nav,
        dialog: pending.dialog(&trip.title),
        action: pending.form_action(),
        toggle,
        cancelled,
    })
}

async fn confirm_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = find_trip(&state, &id).await?;
    let pending = PendingAction::Delete { id };
    Ok(render_confirm(NavBar::new(user), &pending, &trip))
}

async fn delete_confirmed(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    run_pending(&state, user, PendingAction::Delete { id }).await
}

async fn confirm_cancel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let trip = find_trip(&state, &id).await?;
    let pending = PendingAction::toggle_cancel(&trip);
    Ok(render_confirm(NavBar::new(user), &pending, &trip))
}

#[derive(Deserialize)]
struct CancelForm {
    cancelled: bool,
}

async fn cancel_confirmed(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CancelForm>,
) -> Result<Response, AppError> {
    let user = current.require_user()?;
    let pending = PendingAction::ToggleCancel {
        id,
        cancelled: form.cancelled,
    };
    run_pending(&state, user, pending).await
}

async fn run_pending(
    state: &AppState,
    user: &AuthenticatedUser,
    pending: PendingAction,
) -> Result<Response, AppError> {
    if pending.execute(&state.catalog, &user.email).await {
        return Ok(Redirect::to("/").into_response());
    }
    warn!(trip = pending.trip_id(), "confirmed action failed");
    let failure = state.catalog.snapshot().await.error;
    state.catalog.refresh().await;
    Ok(render_management(
        state,
        NavBar::new(user),
        ViewMode::default(),
        StatusCode::BAD_GATEWAY,
        failure,
    )
    .await)
}
