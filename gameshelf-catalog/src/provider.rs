use std::future::Future;

use gameshelf_core::{CatalogGame, GameId};

use crate::client::RawgClient;
use crate::error::CatalogError;
use crate::types::CatalogPage;

/// Source of catalog data. The service holds one of these; tests swap in a
/// fake.
pub trait CatalogProvider: Send + Sync + 'static {
    fn search(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;

    fn details(&self, id: GameId) -> impl Future<Output = Result<CatalogGame, CatalogError>> + Send;

    /// Games in the same series as `id`, at most `limit`.
    fn game_series(
        &self,
        id: GameId,
        limit: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;

    /// Games sharing any of `genres`, best rated first, at most `limit`.
    fn top_rated_in_genres(
        &self,
        genres: &[String],
        limit: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;
}

impl CatalogProvider for RawgClient {
    fn search(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send {
        RawgClient::search(self, term, page, page_size)
    }

    fn details(&self, id: GameId) -> impl Future<Output = Result<CatalogGame, CatalogError>> + Send {
        RawgClient::details(self, id)
    }

    fn game_series(
        &self,
        id: GameId,
        limit: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send {
        RawgClient::game_series(self, id, limit)
    }

    fn top_rated_in_genres(
        &self,
        genres: &[String],
        limit: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send {
        RawgClient::top_rated_in_genres(self, genres, limit)
    }
}
