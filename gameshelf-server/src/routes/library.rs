use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gameshelf_catalog::CatalogProvider;
use gameshelf_core::{
    GameId, LibraryEntryPatch, LibraryItem, PlayStatus, UserId, ValidationError,
};
use gameshelf_lib::ServiceError;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGameRequest {
    game_id: GameId,
    #[serde(default, alias = "playStatus")]
    status: Option<PlayStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

/// Parse the optional `?status=` filter. An empty value means no filter.
fn status_filter(raw: Option<&str>) -> Result<Option<PlayStatus>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            let allowed: Vec<&str> = PlayStatus::ALL.iter().map(PlayStatus::as_str).collect();
            ValidationError::single("status", format!("must be one of {}", allowed.join(", ")))
                .into()
        }),
    }
}

pub async fn list<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiQuery(q): ApiQuery<ListQuery>,
) -> Result<Json<Vec<LibraryItem>>, ApiError> {
    let status = status_filter(q.status.as_deref())?;
    Ok(Json(state.service.list_library(user_id, status).await?))
}

pub async fn add<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(req): ApiJson<AddGameRequest>,
) -> Result<(StatusCode, Json<LibraryItem>), ApiError> {
    auth.require(user_id)?;
    let item = state
        .service
        .add_game(user_id, req.game_id, req.status)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_entry<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath((user_id, game_id)): ApiPath<(UserId, GameId)>,
) -> Result<Json<LibraryItem>, ApiError> {
    state
        .service
        .get_entry(user_id, game_id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::not_found("Game not found in library").into())
}

pub async fn update<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    auth: AuthUser,
    ApiPath((user_id, game_id)): ApiPath<(UserId, GameId)>,
    ApiJson(patch): ApiJson<LibraryEntryPatch>,
) -> Result<Json<LibraryItem>, ApiError> {
    auth.require(user_id)?;
    Ok(Json(
        state.service.update_entry(user_id, game_id, patch).await?,
    ))
}

pub async fn remove<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    auth: AuthUser,
    ApiPath((user_id, game_id)): ApiPath<(UserId, GameId)>,
) -> Result<Json<Value>, ApiError> {
    auth.require(user_id)?;
    state.service.remove_entry(user_id, game_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Game removed from library",
    })))
}
