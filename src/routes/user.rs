use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request;
use crate::types::response;
use crate::types::user::AuthContext;

#[instrument(skip(state))]
pub(crate) async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let users: Vec<response::User> = state
        .user_controller
        .list()
        .await?
        .into_iter()
        .map(response::User::from)
        .collect();

    Ok(Json(users))
}

#[instrument(skip(state))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, Error> {
    let user = state.user_controller.get(id).await?;

    Ok(Json(response::User::from(user)))
}

#[instrument(skip_all, fields(username = %auth.username))]
pub(crate) async fn update_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(params): Json<request::UpdatePasswordData>,
) -> Result<impl IntoResponse, Error> {
    state
        .user_controller
        .change_password(&auth.username, &params.new_password)
        .await?;

    Ok(Json("Password updated successfully"))
}

#[instrument(skip(state))]
pub(crate) async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, Error> {
    state.user_controller.remove(&auth.username).await?;

    Ok(StatusCode::NO_CONTENT)
}
