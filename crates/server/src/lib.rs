#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod play;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use services::AppServices;

pub use error::AppError;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    /// Front-end origins granted CORS access.
    pub allowed_origins: Arc<Vec<String>>,
    /// Public address reported by the health endpoint.
    pub api_url: String,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices, allowed_origins: Vec<String>, api_url: impl Into<String>) -> Self {
        Self {
            services,
            allowed_origins: Arc::new(allowed_origins),
            api_url: api_url.into(),
        }
    }

    fn allows_origin(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .is_ok_and(|origin| self.allowed_origins.iter().any(|allowed| allowed == origin))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::root::routes())
        .merge(handlers::api::routes())
        .nest("/db", handlers::db::routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| state.allows_origin(origin))
        .cloned();

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    if let Some(origin) = origin {
        apply_cors_headers(response.headers_mut(), origin);
    }
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}
