use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::user::AuthContext;

pub(crate) const TOKEN_COOKIE: &str = "token";

const COOKIE_MAX_AGE_SECS: i64 = 3600;

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Token from the session cookie.
pub(crate) fn extract_cookie(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(COOKIE_MAX_AGE_SECS))
        .build()
}

/// Admits the request only with a valid session token, taken from the bearer
/// header or, failing that, the session cookie. Missing and invalid tokens
/// are indistinguishable to the caller.
pub(crate) async fn authorize(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = match extract_bearer(request.headers()) {
        Some(token) => token.to_owned(),
        None => extract_cookie(&jar).ok_or(Error::Unauthorized)?,
    };

    let username = state.tokens.validate(&token)?;

    request.extensions_mut().insert(AuthContext { username });

    Ok(next.run(request).await)
}
