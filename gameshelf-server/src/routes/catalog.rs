use axum::Json;
use axum::extract::State;
use gameshelf_catalog::{CatalogPage, CatalogProvider};
use gameshelf_core::GameId;
use gameshelf_lib::{GamePage, GameReviews, RelatedGames};
use serde::Deserialize;

use crate::AppState;
use crate::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn search<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> Result<Json<CatalogPage>, ApiError> {
    let page = state
        .service
        .search_catalog(&q.query, q.page, q.page_size)
        .await?;
    Ok(Json(page))
}

/// Game details. A signed-in viewer also gets their own library entry.
pub async fn game_page<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiPath(game_id): ApiPath<GameId>,
) -> Result<Json<GamePage>, ApiError> {
    Ok(Json(state.service.game_page(game_id, viewer).await?))
}

pub async fn reviews<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(game_id): ApiPath<GameId>,
) -> Result<Json<GameReviews>, ApiError> {
    Ok(Json(state.service.game_reviews(game_id).await?))
}

/// Up to six related games; an empty list when the catalog cannot help.
pub async fn related<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(game_id): ApiPath<GameId>,
) -> Result<Json<RelatedGames>, ApiError> {
    Ok(Json(state.service.related_games(game_id).await?))
}
