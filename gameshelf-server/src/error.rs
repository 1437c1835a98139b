use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use gameshelf_core::{FieldIssue, ValidationError};
use gameshelf_lib::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// Seconds a client should wait before retrying after an upstream failure.
const RETRY_AFTER_SECS: &str = "5";

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// No token, or a token that does not verify.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid token, wrong user.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed body, path, or query string.
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldIssue]>,
}

fn error_response(status: StatusCode, message: &str, errors: Option<&[FieldIssue]>) -> Response {
    let body = ErrorBody {
        success: false,
        message,
        errors,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Service(ServiceError::Validation(v)) => error_response(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                Some(v.issues.as_slice()),
            ),
            ApiError::Service(ServiceError::NotFound(msg)) => {
                error_response(StatusCode::NOT_FOUND, msg, None)
            }
            ApiError::Service(ServiceError::Conflict(msg)) => {
                error_response(StatusCode::CONFLICT, msg, None)
            }
            ApiError::Service(ServiceError::Unauthorized(msg)) | ApiError::Unauthorized(msg) => {
                error_response(StatusCode::UNAUTHORIZED, msg, None)
            }
            ApiError::Service(ServiceError::UpstreamUnavailable(msg)) => {
                let mut response = error_response(StatusCode::SERVICE_UNAVAILABLE, msg, None);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
                response
            }
            ApiError::Service(ServiceError::Internal(detail)) => {
                log::error!("Request failed: {}", detail);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            ApiError::Forbidden(msg) => error_response(StatusCode::FORBIDDEN, msg, None),
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg, None),
        }
    }
}

/// Well-formed JSON that does not fit the target type is reported per field,
/// like any other validation failure. Syntax errors stay plain 400s.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let issue = data_error_issue(&e.body_text());
                let mut err = ValidationError::new();
                err.push(issue.field, issue.message);
                Self::Service(ServiceError::Validation(err))
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Pull the offending field out of a serde data error such as
/// ``status: unknown variant `finished`, expected ...`` or
/// ``missing field `gameId` at line 1 column 2``.
fn data_error_issue(text: &str) -> FieldIssue {
    let text = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let text = match text.rfind(" at line ") {
        Some(idx) => &text[..idx],
        None => text,
    };

    let is_path = |p: &str| {
        !p.is_empty()
            && p.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
    };
    if let Some((path, message)) = text.split_once(": ") {
        if is_path(path) {
            return FieldIssue {
                field: path.to_string(),
                message: message.to_string(),
            };
        }
    }

    let quoted = ["missing field `", "unknown field `"]
        .iter()
        .find_map(|marker| {
            let rest = &text[text.find(marker)? + marker.len()..];
            rest.split_once('`').map(|(name, _)| name.to_string())
        });
    FieldIssue {
        field: quoted.unwrap_or_else(|| "body".to_string()),
        message: text.to_string(),
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Fatal errors while starting the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Settings error: {0}")]
    Settings(#[from] gameshelf_lib::SettingsError),

    #[error("Database error: {0}")]
    Database(#[from] gameshelf_db::schema::SchemaError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] gameshelf_catalog::CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
