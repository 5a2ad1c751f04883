use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use thiserror::Error;

use crate::auth::SESSION_COOKIE;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => {
                let jar = CookieJar::new().remove(Cookie::build(SESSION_COOKIE).path("/"));
                return (jar, Redirect::to("/login")).into_response();
            }
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Http(_)
            | AppError::Store(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, self.to_string()).into_response()
    }
}

/// Failure talking to the remote document store, for reads and writes alike.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed document: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("image host responded with {0}")]
    Status(u16),
}

/// Sign-in failures. The display text is what the login screen shows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("Nie masz uprawnień do dostępu do tej aplikacji. Skontaktuj się z administratorem.")]
    Denied,
    #[error("Nie udało się zalogować. Spróbuj ponownie.")]
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Main,
    Thumbnail,
}

impl ImageSlot {
    pub fn missing_message(&self) -> &'static str {
        match self {
            ImageSlot::Main => "Zdjęcie główne jest wymagane",
            ImageSlot::Thumbnail => "Miniaturka jest wymagana",
        }
    }
}

/// Trip form failures. Everything except `Upload` is caught before any
/// remote call is made.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Pole \"{0}\" jest wymagane")]
    MissingField(&'static str),
    #[error("Nieprawidłowa data w polu \"{0}\"")]
    InvalidDate(&'static str),
    #[error("Data zakończenia nie może być wcześniejsza niż data rozpoczęcia")]
    InvalidDateRange,
    #[error("Cena musi być liczbą nieujemną")]
    InvalidPrice,
    #[error("{}", .0.missing_message())]
    MissingRequiredImage(ImageSlot),
    #[error("Nie udało się przesłać zdjęcia: {0}")]
    Upload(#[from] UploadError),
}
