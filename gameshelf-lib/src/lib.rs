//! Service layer for GameShelf.
//!
//! [`LibraryService`] composes the SQLite [`Store`] with a
//! [`gameshelf_catalog::CatalogProvider`]. Frontends (the HTTP server, tests)
//! construct one of each and call service methods; they never touch the
//! database or the catalog directly.

pub mod error;
pub mod service;
pub mod settings;
pub mod store;

pub use error::ServiceError;
pub use service::{
    GamePage, GameReviews, LibraryService, RELATED_LIMIT, RelatedGames, USER_SEARCH_LIMIT,
};
pub use settings::{Settings, SettingsError, settings_path};
pub use store::Store;
