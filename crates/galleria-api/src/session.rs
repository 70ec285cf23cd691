//! Session/user management at the HTTP boundary.
//!
//! The user id is a random 128-bit token carried in a cookie. Parsing and
//! minting happen here; below this point user ids travel as typed `Uuid`
//! values, so the store never sees a malformed identifier.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use galleria_core::error::GalleriaError;

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie holding the session user id.
pub const SESSION_COOKIE: &str = "galleria_user";

/// Parse the session cookie, or mint a fresh id when absent.
///
/// A cookie that is present but not a canonical UUID is rejected, not
/// silently replaced.
pub fn resolve_user(jar: &CookieJar) -> Result<Uuid, ApiError> {
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => Uuid::parse_str(cookie.value()).map_err(|_| {
            ApiError::from(GalleriaError::InvalidIdentifier(
                "Session cookie is not a valid user id".to_string(),
            ))
        }),
        None => Ok(Uuid::new_v4()),
    }
}

/// Ensure a session user exists: resolve the id, register it idempotently,
/// and return the jar with the cookie (re)set.
pub fn ensure_user(state: &AppState, jar: CookieJar) -> Result<(Uuid, CookieJar), ApiError> {
    let user_id = resolve_user(&jar)?;
    state.users().upsert(user_id, state.tenant_id())?;
    let jar = jar.add(session_cookie(user_id));
    Ok((user_id, jar))
}

/// Build the session cookie. SameSite=None so credentialed cross-site
/// callers keep their identity; Secure is required alongside it.
pub fn session_cookie(user_id: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, user_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::None);
    cookie
}
