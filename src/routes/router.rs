use crate::core::error;
use crate::core::state::AppState;
use crate::routes::{auth, report, user};
use crate::utils;
use axum::error_handling::HandleErrorLayer;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info_span;

pub(crate) fn routes(
    state: AppState,
    allowed_origins: Vec<HeaderValue>,
    requests_per_second: u64,
) -> Router {
    // /api/...
    let api_router = Router::new()
        .route("/check", get(auth::check))
        .route("/users", get(user::list))
        .route("/users/{id}", get(user::get))
        .route("/users/password", put(user::update_password))
        .route("/users/me", delete(user::delete_me))
        .route("/{id}/reports", get(report::list_for_user))
        .route("/reports/claim", post(report::claim))
        .route("/reports/{report_id}/purchase", post(report::purchase))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::auth::authorize,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/reports", post(report::create))
        .nest("/api", api_router)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(HandleErrorLayer::new(error::handle_middleware_errors))
                .buffer(128)
                .rate_limit(requests_per_second, Duration::from_secs(1))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                        .allow_origin(allowed_origins)
                        .allow_credentials(true),
                ),
        )
}
