use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::Authenticator;
use crate::db::StoreHandle;
use crate::handlers::{auth, dashboard, health, mappings, requirements, test_cases, users};
use crate::service::Services;

#[derive(Clone)]
pub struct TrackerState {
    pub store: StoreHandle,
    pub services: Services,
    pub authenticator: Arc<dyn Authenticator>,
}

impl TrackerState {
    pub fn new(
        store: StoreHandle,
        services: Services,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            store,
            services,
            authenticator,
        }
    }
}

impl FromRef<TrackerState> for Arc<dyn Authenticator> {
    fn from_ref(state: &TrackerState) -> Self {
        state.authenticator.clone()
    }
}

/// Browsers at `origins` may call the API with credentials. A `*` entry
/// opens the API to any origin, and then credentials are not allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o.trim() == "*") {
        warn!("CORS allows any origin; credentialed requests are disabled");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Every route lives under `/api`. Only `/auth/*` and `/health` are public;
/// the rest extract `AuthUser`.
pub fn tracker_router(state: TrackerState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/health", get(health::health))
        .route(
            "/requirements",
            get(requirements::list).post(requirements::create),
        )
        .route(
            "/requirements/{id}",
            get(requirements::get)
                .put(requirements::update)
                .delete(requirements::delete),
        )
        .route(
            "/requirements/{id}/test-cases",
            get(requirements::test_cases),
        )
        .route("/test-cases", get(test_cases::list).post(test_cases::create))
        .route(
            "/test-cases/{id}",
            get(test_cases::get)
                .put(test_cases::update)
                .delete(test_cases::delete),
        )
        .route(
            "/test-cases/{id}/requirements",
            get(test_cases::requirements),
        )
        .route("/mappings", get(mappings::list).post(mappings::create))
        .route("/mappings/{id}", axum::routing::delete(mappings::delete))
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get))
        .route("/dashboard", get(dashboard::summary));

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header::ORIGIN};
    use tower::ServiceExt;

    async fn cors_headers(origins: &[String], origin: &str) -> axum::http::HeaderMap {
        let app: Router = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(origins));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(ORIGIN, origin)
                    .body(Body::empty())
                    .expect("failed to build request"),
            )
            .await
            .expect("request failed");
        resp.headers().clone()
    }

    #[tokio::test]
    async fn wildcard_origin_allows_anyone_without_credentials() {
        let headers = cors_headers(&["*".to_string()], "https://anywhere.test").await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
        assert!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .is_none()
        );
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_with_credentials() {
        let origins = vec!["http://localhost:3000".to_string()];
        let headers = cors_headers(&origins, "http://localhost:3000").await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:3000"))
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );

        let headers = cors_headers(&origins, "https://evil.test").await;
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
