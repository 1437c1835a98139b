//! HTTP surface for GameShelf.
//!
//! [`router`] builds the full axum application around a
//! [`LibraryService`], wrapped in request tracing and a CORS policy for the
//! configured browser origins. The binary in `main.rs` wires it to a real
//! RAWG client and a file-backed store; tests wire it to fakes.

pub mod auth;
pub mod error;
pub mod extract;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::FromRef;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use gameshelf_catalog::CatalogProvider;
use gameshelf_lib::LibraryService;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{AuthUser, Claims, JwtKeys, MaybeAuthUser};
pub use error::{ApiError, StartupError};

/// Shared state handed to every handler.
pub struct AppState<P> {
    pub service: Arc<LibraryService<P>>,
    pub keys: Arc<JwtKeys>,
}

impl<P> AppState<P> {
    pub fn new(service: LibraryService<P>, keys: JwtKeys) -> Self {
        Self {
            service: Arc::new(service),
            keys: Arc::new(keys),
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<P> FromRef<AppState<P>> for Arc<JwtKeys> {
    fn from_ref(state: &AppState<P>) -> Self {
        Arc::clone(&state.keys)
    }
}

/// How long browsers may cache a preflight answer.
const CORS_MAX_AGE: Duration = Duration::from_secs(600);

/// CORS policy admitting exactly `allowed_origins`. Entries that are not
/// valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring unusable CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

pub fn router<P: CatalogProvider>(state: AppState<P>, allowed_origins: &[String]) -> Router {
    use routes::{accounts, catalog, library, social};

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/register", post(accounts::register::<P>))
        .route("/api/login", post(accounts::login::<P>))
        .route("/api/verify", get(accounts::verify::<P>))
        .route("/api/search", get(catalog::search::<P>))
        .route("/api/games/:game_id", get(catalog::game_page::<P>))
        .route("/api/games/:game_id/reviews", get(catalog::reviews::<P>))
        .route("/api/games/:game_id/related", get(catalog::related::<P>))
        .route("/api/users/search", get(social::search_users::<P>))
        .route(
            "/api/users/:id/games",
            get(library::list::<P>).post(library::add::<P>),
        )
        .route(
            "/api/users/:id/games/:game_id",
            get(library::get_entry::<P>)
                .patch(library::update::<P>)
                .delete(library::remove::<P>),
        )
        .route(
            "/api/users/:id/profile",
            get(social::profile::<P>).patch(social::update_profile::<P>),
        )
        .route(
            "/api/users/:id/follow",
            post(social::follow::<P>).delete(social::unfollow::<P>),
        )
        .route("/api/users/:id/followers", get(social::followers::<P>))
        .route("/api/users/:id/following", get(social::following::<P>))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
