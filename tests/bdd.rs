#![allow(dead_code)]

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
};
use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use listravel::{
    auth::{SessionGate, SESSION_COOKIE},
    config::AppConfig,
    error::{ImageSlot, LoginError},
    forms::{CreateTrip, SubmitResult, TripForm, UpdateTrip},
    models::{
        session::SessionState,
        trip::{Trip, TripDraft, TripPatch},
        user::{AuthenticatedUser, Credentials, ProviderUser},
    },
    routes::create_router,
    services::{
        allow_list::{is_authorized, MemoryAllowList},
        identity::MemoryIdentity,
        images::{ImageUpload, MemoryImageHost},
        trips::{MemoryTripStore, TripCatalog},
    },
    state::AppState,
    views::{ManagementView, TripCard, ViewMode},
};
use tokio::task::JoinHandle;
use tower::ServiceExt;

const ACTOR: &str = "ala@example.com";
const MAIN_IMAGE: &str = "https://res.cloudinary.com/demo/image/upload/listravel/trips/main.jpg";
const THUMBNAIL: &str =
    "https://res.cloudinary.com/demo/image/upload/listravel/thumbnails/thumb.jpg";

#[derive(Debug, cucumber::World, Default)]
struct TravelWorld {
    app: Option<TestApp>,
    authorized: Option<bool>,
    login: Option<Result<ProviderUser, LoginError>>,
    session: Option<SessionState>,
    form: TripForm,
    outcome: Option<Result<SubmitResult, String>>,
    trip_ids: HashMap<String, String>,
    view: Option<ManagementView>,
    cookie: Option<String>,
    response: Option<TestResponse>,
    background_refresh: Option<JoinHandle<bool>>,
}

impl TravelWorld {
    fn app(&self) -> &TestApp {
        self.app
            .as_ref()
            .expect("application must be initialised first")
    }

    fn trip_id(&self, title: &str) -> String {
        self.trip_ids
            .get(title)
            .cloned()
            .unwrap_or_else(|| panic!("no stored trip titled {title}"))
    }

    fn response(&self) -> &TestResponse {
        self.response.as_ref().expect("no request was made")
    }

    fn card(&self, title: &str) -> TripCard {
        let view = self.view.as_ref().expect("trips were not looked at");
        view.upcoming
            .iter()
            .chain(view.archived.iter())
            .flat_map(|section| section.cards.iter())
            .find(|card| card.title == title)
            .cloned()
            .unwrap_or_else(|| panic!("no card titled {title}"))
    }
}

struct TestApp {
    state: AppState,
    identity: Arc<MemoryIdentity>,
    allow_list: Arc<MemoryAllowList>,
    store: Arc<MemoryTripStore>,
    images: Arc<MemoryImageHost>,
}

impl fmt::Debug for TestApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApp").finish()
    }
}

impl TestApp {
    fn new() -> Self {
        let identity = Arc::new(
            MemoryIdentity::new()
                .with_account("ala@example.com", "tajne", Some("Ala"))
                .with_account("obcy@example.com", "tajne", None),
        );
        let allow_list = Arc::new(MemoryAllowList::new(vec!["ala@example.com".into()]));
        let store = Arc::new(MemoryTripStore::new());
        let images = Arc::new(MemoryImageHost::new());

        let gate = SessionGate::new(identity.clone(), allow_list.clone());
        let catalog = TripCatalog::new(store.clone());
        let state = AppState::new(
            AppConfig::memory("bdd-cookie-secret"),
            gate,
            catalog,
            images.clone(),
        );
        Self {
            state,
            identity,
            allow_list,
            store,
            images,
        }
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = create_router(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let session_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        TestResponse {
            status,
            location,
            session_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

#[derive(Debug)]
struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    session_cookie: Option<String>,
    body: String,
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date in YYYY-MM-DD form")
}

fn draft(title: &str, start: &str, end: &str) -> TripDraft {
    TripDraft {
        start_date: date(start),
        end_date: date(end),
        title: title.to_string(),
        description: format!("{title} w pigułce"),
        price: 1999.0,
        image_url: MAIN_IMAGE.into(),
        thumbnail_url: THUMBNAIL.into(),
        cancelled: false,
    }
}

fn jpeg(name: &str) -> ImageUpload {
    ImageUpload::new(vec![0xff, 0xd8, 0xff, 0xe0], name, "image/jpeg")
}

async fn store_trip(world: &mut TravelWorld, trip: Trip) {
    let title = trip.title.clone();
    let id = world.app().store.seed(trip).await;
    world.trip_ids.insert(title, id);
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

fn post_form(path: &str, body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

// Setup

#[given("a fresh application")]
async fn given_fresh_application(world: &mut TravelWorld) {
    *world = TravelWorld {
        app: Some(TestApp::new()),
        ..TravelWorld::default()
    };
}

#[given(regex = r#"^the allow-list contains "([^"]+)"$"#)]
async fn given_allow_list(world: &mut TravelWorld, email: String) {
    world.app().allow_list.set_emails(Some(vec![email])).await;
}

#[given("the allow-list document is missing")]
async fn given_allow_list_missing(world: &mut TravelWorld) {
    world.app().allow_list.set_emails(None).await;
}

#[given("the allow-list store is failing")]
async fn given_allow_list_failing(world: &mut TravelWorld) {
    world.app().allow_list.set_failing(true);
}

#[given("the identity provider fails to sign out")]
async fn given_failing_sign_out(world: &mut TravelWorld) {
    world.app().identity.set_failing_sign_out(true);
}

#[given(regex = r#"^a stored trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn given_stored_trip(world: &mut TravelWorld, title: String, start: String, end: String) {
    let trip = draft(&title, &start, &end).into_trip(None);
    store_trip(world, trip).await;
}

#[given(regex = r#"^a stored cancelled trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn given_stored_cancelled_trip(
    world: &mut TravelWorld,
    title: String,
    start: String,
    end: String,
) {
    let mut trip = draft(&title, &start, &end).into_trip(None);
    trip.cancelled = true;
    store_trip(world, trip).await;
}

#[given("the trip store is failing")]
async fn given_store_failing(world: &mut TravelWorld) {
    world.app().store.set_failing(true);
}

#[given("the catalog has been refreshed")]
async fn given_catalog_refreshed(world: &mut TravelWorld) {
    assert!(world.app().state.catalog.refresh().await);
}

// Allow-list

#[when(regex = r#"^I check whether "([^"]+)" is authorized$"#)]
async fn when_check_authorized(world: &mut TravelWorld, email: String) {
    let allowed = is_authorized(world.app().allow_list.as_ref(), Some(&email)).await;
    world.authorized = Some(allowed);
}

#[then("access is granted")]
async fn then_access_granted(world: &mut TravelWorld) {
    assert_eq!(world.authorized, Some(true));
}

#[then("access is denied")]
async fn then_access_denied(world: &mut TravelWorld) {
    assert_eq!(world.authorized, Some(false));
}

// Sessions

#[when(regex = r#"^I sign in as "([^"]+)" with password "([^"]+)"$"#)]
async fn when_sign_in(world: &mut TravelWorld, email: String, password: String) {
    let credentials = Credentials { email, password };
    world.login = Some(world.app().state.gate.login(&credentials).await);
}

#[then("the sign-in succeeds")]
async fn then_sign_in_succeeds(world: &mut TravelWorld) {
    let login = world.login.as_ref().expect("no sign-in attempted");
    assert!(login.is_ok(), "sign-in failed: {login:?}");
}

#[then(regex = r#"^the sign-in fails with "([^"]+)"$"#)]
async fn then_sign_in_fails(world: &mut TravelWorld, message: String) {
    match world.login.as_ref().expect("no sign-in attempted") {
        Ok(user) => panic!("expected a failed sign-in, got {user:?}"),
        Err(err) => assert_eq!(err.to_string(), message),
    }
}

#[when(regex = r#"^a session for "([^"]+)" is restored$"#)]
async fn when_session_restored(world: &mut TravelWorld, email: String) {
    let user = ProviderUser {
        uid: format!("uid-{email}"),
        email: Some(email),
        display_name: None,
        id_token: None,
    };
    world.session = Some(world.app().state.gate.restore(Some(user)).await);
}

#[then("the session is signed out")]
async fn then_session_signed_out(world: &mut TravelWorld) {
    assert_eq!(world.session, Some(SessionState::SignedOut));
}

#[then(regex = r#"^the session belongs to "([^"]+)"$"#)]
async fn then_session_belongs_to(world: &mut TravelWorld, email: String) {
    let session = world.session.as_ref().expect("no session restored");
    assert_eq!(session.user().map(|user| user.email.as_str()), Some(email.as_str()));
}

#[when(regex = r#"^"([^"]+)" signs out$"#)]
async fn when_signs_out(world: &mut TravelWorld, email: String) {
    let user = AuthenticatedUser {
        uid: format!("uid-{email}"),
        email,
        display_name: None,
    };
    world.app().state.gate.logout(&user).await;
}

#[then(regex = r"^the identity provider recorded (\d+) sign-outs?$")]
async fn then_sign_out_count(world: &mut TravelWorld, expected: usize) {
    assert_eq!(world.app().identity.sign_out_count(), expected);
}

// Catalog

#[when("the catalog refreshes")]
async fn when_catalog_refreshes(world: &mut TravelWorld) {
    world.app().state.catalog.refresh().await;
}

#[when("the trip store starts failing")]
async fn when_store_starts_failing(world: &mut TravelWorld) {
    world.app().store.set_failing(true);
}

#[when(regex = r#"^I create a trip "([^"]+)" from "([^"]+)" to "([^"]+)" through the catalog$"#)]
async fn when_catalog_create(world: &mut TravelWorld, title: String, start: String, end: String) {
    let created = world
        .app()
        .state
        .catalog
        .create(draft(&title, &start, &end), ACTOR)
        .await;
    if let Some(id) = created {
        world.trip_ids.insert(title, id);
    }
}

#[given(regex = r"^the trip store answers listings after (\d+) milliseconds$")]
async fn given_slow_listing(world: &mut TravelWorld, millis: u64) {
    world
        .app()
        .store
        .set_list_delay(Duration::from_millis(millis));
}

#[when("a refresh is running in the background")]
async fn when_background_refresh(world: &mut TravelWorld) {
    let catalog = world.app().state.catalog.clone();
    world.background_refresh = Some(tokio::spawn(async move { catalog.refresh().await }));
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[then("the background refresh finishes")]
async fn then_background_refresh_finishes(world: &mut TravelWorld) {
    let handle = world
        .background_refresh
        .take()
        .expect("no background refresh started");
    assert!(handle.await.expect("refresh task"));
}

#[when(regex = r#"^I cancel "([^"]+)" through the catalog$"#)]
async fn when_catalog_cancel(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    world
        .app()
        .state
        .catalog
        .update(&id, TripPatch::cancelled(true), ACTOR)
        .await;
}

#[when(regex = r#"^I delete "([^"]+)" through the catalog$"#)]
async fn when_catalog_delete(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    world.app().state.catalog.delete(&id).await;
}

#[then(regex = r#"^the catalog contains "([^"]+)"$"#)]
async fn then_catalog_contains(world: &mut TravelWorld, title: String) {
    let snapshot = world.app().state.catalog.snapshot().await;
    assert!(snapshot.trips.iter().any(|trip| trip.title == title));
}

#[then(regex = r#"^the catalog shows "([^"]+)" as cancelled$"#)]
async fn then_catalog_shows_cancelled(world: &mut TravelWorld, title: String) {
    let snapshot = world.app().state.catalog.snapshot().await;
    let trip = snapshot
        .trips
        .iter()
        .find(|trip| trip.title == title)
        .unwrap_or_else(|| panic!("{title} is not in the catalog"));
    assert!(trip.cancelled);
}

#[then(regex = r"^the catalog lists (\d+) trips?$")]
async fn then_catalog_lists(world: &mut TravelWorld, expected: usize) {
    let snapshot = world.app().state.catalog.snapshot().await;
    assert_eq!(snapshot.trips.len(), expected);
    assert!(!snapshot.loading);
}

#[then("the catalog shows no error")]
async fn then_catalog_no_error(world: &mut TravelWorld) {
    assert_eq!(world.app().state.catalog.snapshot().await.error, None);
}

#[then(regex = r#"^the catalog shows the error "([^"]+)"$"#)]
async fn then_catalog_error(world: &mut TravelWorld, message: String) {
    let snapshot = world.app().state.catalog.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some(message.as_str()));
}

#[then(regex = r"^the store was listed (\d+) times?$")]
async fn then_store_listed(world: &mut TravelWorld, expected: usize) {
    assert_eq!(world.app().store.list_calls(), expected);
}

// Form

#[given(
    regex = r#"^a filled trip form titled "([^"]+)" from "([^"]+)" to "([^"]+)" priced "([^"]+)"$"#
)]
async fn given_filled_form(
    world: &mut TravelWorld,
    title: String,
    start: String,
    end: String,
    price: String,
) {
    world.form = TripForm {
        title,
        description: "Opis wycieczki".into(),
        start_date: start,
        end_date: end,
        price,
        ..TripForm::default()
    };
}

#[given("the form has both images selected")]
async fn given_both_images(world: &mut TravelWorld) {
    world.form.select_image(ImageSlot::Main, jpeg("main.jpg"));
    world.form.select_image(ImageSlot::Thumbnail, jpeg("thumb.jpg"));
}

#[given("the form has only the main image selected")]
async fn given_main_image_only(world: &mut TravelWorld) {
    world.form.select_image(ImageSlot::Main, jpeg("main.jpg"));
}

#[given(regex = r#"^the form ends on "([^"]+)"$"#)]
async fn given_form_end(world: &mut TravelWorld, end: String) {
    world.form.end_date = end;
}

#[given(regex = r#"^the form edits the stored trip "([^"]+)"$"#)]
async fn given_form_edits(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    let trip = world.app().store.get(&id).await.expect("stored trip");
    world.form = TripForm::for_trip(&trip);
}

#[when("I submit the form as a new trip")]
async fn when_submit_new(world: &mut TravelWorld) {
    let app = world.app.as_ref().expect("application must be initialised first");
    let submitter = CreateTrip {
        catalog: &app.state.catalog,
        actor: ACTOR,
    };
    let outcome = world
        .form
        .submit(app.images.as_ref(), &submitter)
        .await
        .map_err(|err| err.to_string());
    world.outcome = Some(outcome);
}

#[when(regex = r#"^I submit the form as an update of "([^"]+)"$"#)]
async fn when_submit_update(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    let app = world.app.as_ref().expect("application must be initialised first");
    let submitter = UpdateTrip {
        catalog: &app.state.catalog,
        id: &id,
        actor: ACTOR,
    };
    let outcome = world
        .form
        .submit(app.images.as_ref(), &submitter)
        .await
        .map_err(|err| err.to_string());
    world.outcome = Some(outcome);
}

#[then(regex = r#"^the form reports "([^"]+)"$"#)]
async fn then_form_reports(world: &mut TravelWorld, message: String) {
    match world.outcome.as_ref().expect("form was not submitted") {
        Ok(result) => panic!("expected a form error, got {result:?}"),
        Err(err) => assert_eq!(err, &message),
    }
}

#[then("the submit was rejected")]
async fn then_submit_rejected(world: &mut TravelWorld) {
    assert_eq!(world.outcome, Some(Ok(SubmitResult::Rejected)));
}

#[then("the submit was accepted")]
async fn then_submit_accepted(world: &mut TravelWorld) {
    assert_eq!(world.outcome, Some(Ok(SubmitResult::Accepted)));
}

#[then("a trip was created")]
async fn then_trip_created(world: &mut TravelWorld) {
    let outcome = world.outcome.as_ref().expect("form was not submitted");
    assert!(
        matches!(outcome, Ok(SubmitResult::Created(_))),
        "unexpected outcome {outcome:?}"
    );
    assert_eq!(world.app().store.write_count(), 1);
}

#[then(regex = r"^(\d+) images? (?:was|were) uploaded$")]
async fn then_images_uploaded(world: &mut TravelWorld, expected: usize) {
    assert_eq!(world.app().images.upload_count(), expected);
}

#[then(regex = r"^the trip store received (\d+) writes?$")]
async fn then_store_writes(world: &mut TravelWorld, expected: usize) {
    assert_eq!(world.app().store.write_count(), expected);
}

#[then(regex = r#"^the form title is still "([^"]+)"$"#)]
async fn then_form_title(world: &mut TravelWorld, title: String) {
    assert_eq!(world.form.title, title);
}

#[then("the staged images are kept")]
async fn then_staged_images_kept(world: &mut TravelWorld) {
    assert!(world.form.pending(ImageSlot::Main).is_some());
    assert!(world.form.pending(ImageSlot::Thumbnail).is_some());
}

#[given(regex = r#"^the form is retitled "([^"]+)"$"#)]
async fn given_form_retitled(world: &mut TravelWorld, title: String) {
    world.form.title = title;
}

#[then("the form is empty")]
async fn then_form_empty(world: &mut TravelWorld) {
    assert_eq!(world.form, TripForm::default());
}

#[then(regex = r#"^the stored trip "([^"]+)" still has its original images$"#)]
async fn then_original_images(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    let trip = world.app().store.get(&id).await.expect("stored trip");
    assert_eq!(trip.image_url, MAIN_IMAGE);
    assert_eq!(trip.thumbnail_url, THUMBNAIL);
    assert_eq!(trip.updated_by.as_deref(), Some(ACTOR));
}

// Management view

#[when(regex = r#"^I look at the trips on "([^"]+)"$"#)]
async fn when_look_at_trips(world: &mut TravelWorld, today: String) {
    let catalog = &world.app().state.catalog;
    catalog.refresh().await;
    let snapshot = catalog.snapshot().await;
    world.view = Some(ManagementView::build(
        &snapshot.trips,
        date(&today),
        ViewMode::Cards,
    ));
}

#[then(regex = r#"^the upcoming months are "([^"]*)"$"#)]
async fn then_upcoming_months(world: &mut TravelWorld, labels: String) {
    let view = world.view.as_ref().expect("trips were not looked at");
    let actual: Vec<&str> = view.upcoming.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(actual.join(", "), labels);
}

#[then(regex = r#"^the archived months are "([^"]*)"$"#)]
async fn then_archived_months(world: &mut TravelWorld, labels: String) {
    let view = world.view.as_ref().expect("trips were not looked at");
    let actual: Vec<&str> = view.archived.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(actual.join(", "), labels);
}

#[then(regex = r#"^the card for "([^"]+)" lasts "([^"]+)"$"#)]
async fn then_card_lasts(world: &mut TravelWorld, title: String, duration: String) {
    assert_eq!(world.card(&title).duration, duration);
}

#[then(regex = r#"^the card for "([^"]+)" counts down "([^"]+)"$"#)]
async fn then_card_countdown(world: &mut TravelWorld, title: String, countdown: String) {
    assert_eq!(world.card(&title).countdown, Some(countdown));
}

#[then(regex = r#"^the card for "([^"]+)" is upcoming$"#)]
async fn then_card_upcoming(world: &mut TravelWorld, title: String) {
    let view = world.view.as_ref().expect("trips were not looked at");
    let upcoming = view
        .upcoming
        .iter()
        .flat_map(|section| section.cards.iter())
        .any(|card| card.title == title);
    assert!(upcoming, "{title} is not in the upcoming partition");
}

#[then(regex = r#"^the card for "([^"]+)" is marked ongoing$"#)]
async fn then_card_ongoing(world: &mut TravelWorld, title: String) {
    let card = world.card(&title);
    assert!(card.ongoing);
    assert_eq!(card.countdown, None);
}

// HTTP

#[given(regex = r#"^I am signed in as "([^"]+)" with password "([^"]+)"$"#)]
async fn given_signed_in(world: &mut TravelWorld, email: String, password: String) {
    let body = format!("email={}&password={}", email.replace('@', "%40"), password);
    let response = world
        .app()
        .request(post_form("/login", body, None))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    world.cookie = Some(response.session_cookie.expect("session cookie"));
}

#[when(regex = r#"^I open "([^"]+)" without signing in$"#)]
async fn when_open_anonymous(world: &mut TravelWorld, path: String) {
    world.response = Some(world.app().request(get(&path, None)).await);
}

#[when(regex = r#"^I open "([^"]+)"$"#)]
async fn when_open(world: &mut TravelWorld, path: String) {
    let request = get(&path, world.cookie.as_deref());
    world.response = Some(world.app().request(request).await);
}

#[when(regex = r#"^I open the delete confirmation for "([^"]+)"$"#)]
async fn when_open_delete_confirmation(world: &mut TravelWorld, title: String) {
    let path = format!("/trips/{}/delete", world.trip_id(&title));
    let request = get(&path, world.cookie.as_deref());
    world.response = Some(world.app().request(request).await);
}

#[when(regex = r#"^I confirm deleting "([^"]+)"$"#)]
async fn when_confirm_delete(world: &mut TravelWorld, title: String) {
    let path = format!("/trips/{}/delete", world.trip_id(&title));
    let request = post_form(&path, String::new(), world.cookie.as_deref());
    world.response = Some(world.app().request(request).await);
}

#[when(regex = r#"^I confirm cancelling "([^"]+)"$"#)]
async fn when_confirm_cancel(world: &mut TravelWorld, title: String) {
    let path = format!("/trips/{}/cancel", world.trip_id(&title));
    let request = post_form(&path, "cancelled=true".into(), world.cookie.as_deref());
    world.response = Some(world.app().request(request).await);
}

#[then(regex = r#"^I am redirected to "([^"]+)"$"#)]
async fn then_redirected(world: &mut TravelWorld, location: String) {
    let response = world.response();
    assert!(
        response.status.is_redirection(),
        "expected a redirect, got {}",
        response.status
    );
    assert_eq!(response.location.as_deref(), Some(location.as_str()));
}

#[then(regex = r"^the response status is (\d+)$")]
async fn then_response_status(world: &mut TravelWorld, status: u16) {
    assert_eq!(world.response().status.as_u16(), status);
}

#[then(regex = r#"^the page shows "([^"]+)"$"#)]
async fn then_page_shows(world: &mut TravelWorld, text: String) {
    let response = world.response();
    assert!(
        response.body.contains(&text),
        "page does not contain {text:?}"
    );
}

#[then(regex = r#"^the stored trip "([^"]+)" exists$"#)]
async fn then_trip_exists(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    assert!(world.app().store.get(&id).await.is_some());
    assert_eq!(world.app().store.write_count(), 0);
}

#[then(regex = r#"^the stored trip "([^"]+)" is gone$"#)]
async fn then_trip_gone(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    assert!(world.app().store.get(&id).await.is_none());
}

#[then(regex = r#"^the stored trip "([^"]+)" is cancelled$"#)]
async fn then_trip_cancelled(world: &mut TravelWorld, title: String) {
    let id = world.trip_id(&title);
    let trip = world.app().store.get(&id).await.expect("stored trip");
    assert!(trip.cancelled);
    assert_eq!(trip.updated_by.as_deref(), Some(ACTOR));
}

#[tokio::main]
async fn main() {
    TravelWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
