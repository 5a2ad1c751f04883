use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::user::Credentials,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", post(logout))
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    show_error: bool,
    error_message: String,
    email: String,
}

async fn login_form(current: CurrentUser) -> Response {
    if current.0.is_some() {
        return Redirect::to("/").into_response();
    }
    AskamaTemplateResponse::into_response(LoginTemplate {
        show_error: false,
        error_message: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };
    match state.gate.login(&credentials).await {
        Ok(user) => {
            let cookie = auth::session_cookie(&user)?;
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        Err(err) => Ok((
            StatusCode::BAD_REQUEST,
            auth::clear_session_cookie(jar),
            AskamaTemplateResponse::into_response(LoginTemplate {
                show_error: true,
                error_message: err.to_string(),
                email: credentials.email,
            }),
        )
            .into_response()),
    }
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(user) = &current.0 {
        state.gate.logout(user).await;
    }
    (auth::clear_session_cookie(jar), Redirect::to("/login"))
}
