use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::{LoginData, RegisterData};
use crate::types::response;
use crate::types::user::AuthContext;
use crate::utils::auth::session_cookie;

#[instrument(skip_all, fields(username = %user_data.username))]
pub(crate) async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(user_data): Json<RegisterData>,
) -> Result<(StatusCode, CookieJar, Json<response::Login>), Error> {
    let (user, token) = state
        .user_controller
        .register(&user_data.username, &user_data.email, &user_data.password)
        .await?;

    let body = response::Login::new(&user.username, &token);

    Ok((StatusCode::CREATED, jar.add(session_cookie(token)), Json(body)))
}

#[instrument(skip_all, fields(username = %user_data.username))]
pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(user_data): Json<LoginData>,
) -> Result<(CookieJar, Json<response::Login>), Error> {
    let (user, token) = state
        .user_controller
        .login(&user_data.username, &user_data.password)
        .await?;

    let body = response::Login::new(&user.username, &token);

    Ok((jar.add(session_cookie(token)), Json(body)))
}

pub(crate) async fn check(Extension(auth): Extension<AuthContext>) -> Json<response::AuthCheck> {
    Json(response::AuthCheck {
        status: "ok",
        username: auth.username,
    })
}
