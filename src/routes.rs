use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{console, functions, public};
use crate::middleware::route_guard;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Admin functions (bearer token)
        .merge(function_routes(&state))
        // Console (session cookie or bearer token)
        .merge(console_routes())
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn function_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/functions/v1/upload-and-insert", post(functions::upload_and_insert))
        .route("/functions/v1/delete-book-and-files", post(functions::delete_book_and_files))
        .layer(DefaultBodyLimit::max(state.config.upload.max_body_bytes()))
}

fn console_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(console::dashboard))
        .route("/books/:id", get(console::book_detail))
        .route("/books/:id/edit", put(console::book_edit))
        .route("/analytics", get(console::analytics))
        .route("/settings", get(console::settings))
        .route("/settings/invite", post(console::invite))
        .route("/settings/admins/:id/revoke", post(console::revoke_admin))
        .route("/settings/session/refresh", post(console::refresh_session))
        .route("/login", get(console::login_form).post(console::login))
        .route("/logout", post(console::logout))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ]);

    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let (state, _) = AppState::in_memory(AppConfig::in_memory("secret"));
        app(state)
    }

    #[tokio::test]
    async fn root_is_public() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn console_without_session_redirects() {
        let response = router()
            .oneshot(Request::builder().uri("/analytics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn preflight_allows_function_headers() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/functions/v1/upload-and-insert")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,x-client-info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
