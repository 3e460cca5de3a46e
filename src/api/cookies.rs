//! Cookie binding for the token pair.
//!
//! Both cookies are HttpOnly; the Secure flag follows
//! `server.secure_cookies`. Clearing must repeat the exact attribute set used
//! when setting, or browsers will not drop the cookies.

use axum::http::{HeaderMap, header};
use axum::response::AppendHeaders;

use crate::services::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn build(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { " Secure;" } else { "" };
    format!(
        "{name}={value}; HttpOnly;{secure_attr} SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    )
}

/// Set-Cookie headers carrying a freshly issued pair.
pub fn set_pair(
    tokens: &TokenPair,
    access_max_age_secs: i64,
    refresh_max_age_secs: i64,
    secure: bool,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (
            header::SET_COOKIE,
            build(ACCESS_COOKIE, &tokens.access_token, access_max_age_secs, secure),
        ),
        (
            header::SET_COOKIE,
            build(
                REFRESH_COOKIE,
                &tokens.refresh_token,
                refresh_max_age_secs,
                secure,
            ),
        ),
    ])
}

/// Set-Cookie headers that clear both cookies (Max-Age=0, same attributes).
pub fn clear_pair(secure: bool) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (header::SET_COOKIE, build(ACCESS_COOKIE, "", 0, secure)),
        (header::SET_COOKIE, build(REFRESH_COOKIE, "", 0, secure)),
    ])
}

/// Pull a named cookie out of the request's Cookie header.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(ToString::to_string)
    })
}
