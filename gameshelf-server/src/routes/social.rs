use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gameshelf_catalog::CatalogProvider;
use gameshelf_core::{Follow, ProfileUpdate, User, UserId, UserProfile, UserSummary};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    query: String,
}

pub async fn search_users<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiQuery(q): ApiQuery<UserSearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.service.search_users(&q.query).await?))
}

pub async fn profile<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.profile(user_id).await?))
}

pub async fn update_profile<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    auth.require(user_id)?;
    Ok(Json(state.service.update_profile(user_id, update).await?))
}

/// The caller follows the user named in the path.
pub async fn follow<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    AuthUser(follower_id): AuthUser,
    ApiPath(followee_id): ApiPath<UserId>,
) -> Result<(StatusCode, Json<Follow>), ApiError> {
    let follow = state.service.follow(follower_id, followee_id).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

pub async fn unfollow<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    AuthUser(follower_id): AuthUser,
    ApiPath(followee_id): ApiPath<UserId>,
) -> Result<Json<Value>, ApiError> {
    state.service.unfollow(follower_id, followee_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Unfollowed user",
    })))
}

pub async fn followers<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.service.followers(user_id).await?))
}

pub async fn following<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.service.following(user_id).await?))
}
