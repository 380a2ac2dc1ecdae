use rocket::{http::Status, serde::json::Json};
use schemars::JsonSchema;
use serde::Serialize;

/// JSON error envelope. Every failed request carries the HTTP status, a
/// human-readable description, and a machine-readable tag from the route's
/// own error enum.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Error<E: Serialize> {
    pub error: Inner<E>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Inner<E: Serialize> {
    pub code: u16,
    pub description: String,
    pub reason: Option<&'static str>,
    pub status: E,
}

impl<E: Serialize> Error<E> {
    fn new(http_status: Status, description: String, error: E) -> Self {
        Self {
            error: Inner {
                code: http_status.code,
                description,
                reason: http_status.reason(),
                status: error,
            },
        }
    }
}

pub type JsonError<E> = (Status, Json<Error<E>>);

pub type JsonResult<T, E> = Result<Json<T>, JsonError<E>>;

pub fn bad_request<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (
        Status::BadRequest,
        Json(Error::new(Status::BadRequest, description, error)),
    )
}

pub fn unauthorized<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (
        Status::Unauthorized,
        Json(Error::new(Status::Unauthorized, description, error)),
    )
}

pub fn not_found<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (
        Status::NotFound,
        Json(Error::new(Status::NotFound, description, error)),
    )
}

pub fn internal_server_error<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (
        Status::InternalServerError,
        Json(Error::new(Status::InternalServerError, description, error)),
    )
}

/// Logs the underlying failure with enough context for diagnosis and returns
/// a generic 500; storage detail never reaches clients.
pub fn storage_failure<E: Serialize>(
    error: E,
    operation: &'static str,
    user_id: Option<app::user::Id>,
    cause: &dyn std::error::Error,
) -> JsonError<E> {
    match user_id {
        Some(user_id) => log::error!("{} failed for user {:?}: {}", operation, user_id, cause),
        None => log::error!("{} failed: {}", operation, cause),
    }
    internal_server_error(error, "internal server error".to_owned())
}
