use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::Session;
use crate::state::AppState;

/// Console sections that need a signed-in user
pub const PROTECTED_PREFIXES: [&str; 4] = ["/dashboard", "/books", "/analytics", "/settings"];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToLogin,
    RedirectToDashboard,
}

/// `/books` and `/books/1` are protected; `/bookshelf` is not.
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

pub fn decide(path: &str, has_session: bool) -> GuardDecision {
    if !has_session && is_protected(path) {
        GuardDecision::RedirectToLogin
    } else if has_session && path == LOGIN_PATH {
        GuardDecision::RedirectToDashboard
    } else {
        GuardDecision::Pass
    }
}

/// Redirects by session presence only; roles are checked by each endpoint.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let session = Session::from_headers(request.headers(), &state.config.security.session_cookie, &state.tokens);

    match decide(request.uri().path(), session.is_some()) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToLogin => Redirect::temporary(LOGIN_PATH).into_response(),
        GuardDecision::RedirectToDashboard => Redirect::temporary(HOME_PATH).into_response(),
    }
}
