//! RAWG game catalog client.
//!
//! The service layer only sees the [`CatalogProvider`] trait; [`RawgClient`]
//! is the production implementation.

pub mod client;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RawgClient};
pub use credentials::{
    ApiKeySource, api_key_source, credentials_path, load_api_key, save_api_key,
};
pub use error::CatalogError;
pub use provider::CatalogProvider;
pub use types::CatalogPage;
