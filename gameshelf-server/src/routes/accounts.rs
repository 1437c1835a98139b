use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gameshelf_catalog::CatalogProvider;
use gameshelf_lib::ServiceError;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn register<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = state
        .service
        .register(req.email.trim(), req.username.trim(), &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "userId": user.id,
        })),
    ))
}

pub async fn login<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .service
        .login(req.username.trim(), &req.password)
        .await?;
    let token = state.keys.issue(&user)?;
    log::info!("User {} logged in", user.id);
    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "expiresIn": state.keys.ttl_secs(),
        "userId": user.id,
        "username": user.username,
    })))
}

pub async fn verify<P: CatalogProvider>(
    State(state): State<AppState<P>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state.service.get_user(user_id).await.map_err(|e| match e {
        ServiceError::NotFound(_) => ApiError::Unauthorized("Invalid or expired token".to_string()),
        other => other.into(),
    })?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }
    Ok(Json(json!({
        "message": "Token is valid",
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
        },
    })))
}
