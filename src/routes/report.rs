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
pub(crate) async fn create(
    State(state): State<AppState>,
    Json(params): Json<request::NewReport>,
) -> Result<impl IntoResponse, Error> {
    let report = state.report_controller.create(params).await?;

    Ok((StatusCode::CREATED, Json(report)))
}

#[instrument(skip(state))]
pub(crate) async fn list_for_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, Error> {
    let reports = state.report_controller.list_for_identity(id).await?;

    Ok(Json(reports))
}

#[instrument(skip(state))]
pub(crate) async fn claim(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(params): Json<request::ClaimReports>,
) -> Result<impl IntoResponse, Error> {
    let user = state.user_controller.get_by_username(&auth.username).await?;

    let claimed = state
        .report_controller
        .claim(&params.client_generated_id, user.id)
        .await?;

    Ok(Json(response::Claimed { claimed }))
}

#[instrument(skip(state))]
pub(crate) async fn purchase(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let receipt = state.purchase_controller.purchase(&report_id).await?;

    Ok(Json(receipt))
}
