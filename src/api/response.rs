use axum::async_trait;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::registry::{FieldError, ServiceError};

// ============================================================================
// JSend status enum
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    Error,
    Fail,
    Success,
}

// ============================================================================
// JSend success envelope
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JSend<T: Serialize> {
    pub data: T,
    pub status: JSendStatus,
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Json<JSend<T>> {
        Json(JSend {
            data,
            status: JSendStatus::Success,
        })
    }
}

// ============================================================================
// JSend failure envelope (fail for 4xx, error for 5xx)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JSendFail {
    pub errors: Vec<FieldError>,
    pub status: JSendStatus,
}

impl JSendFail {
    pub fn response(
        status_code: StatusCode,
        status: JSendStatus,
        errors: Vec<FieldError>,
    ) -> (StatusCode, Json<JSendFail>) {
        (status_code, Json(JSendFail { errors, status }))
    }
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// A JSend-compatible error that can be either a fail (4xx) or error (5xx).
/// Used as the error type in handler Result returns.
#[derive(Debug)]
pub enum ApiError {
    Fail(StatusCode, Vec<FieldError>),
    Error(StatusCode, String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Fail(code, errors) => {
                JSendFail::response(code, JSendStatus::Fail, errors).into_response()
            }
            ApiError::Error(code, msg) => {
                JSendFail::response(code, JSendStatus::Error, vec![FieldError::general(msg)])
                    .into_response()
            }
        }
    }
}

impl ApiError {
    pub fn fail(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Fail(status, vec![FieldError::general(message)])
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            vec![FieldError::new(field, message)],
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::fail(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Error(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(errors) => {
                ApiError::Fail(StatusCode::UNPROCESSABLE_ENTITY, errors)
            }
            ServiceError::Conflict(error) => {
                ApiError::Fail(StatusCode::UNPROCESSABLE_ENTITY, vec![error])
            }
            ServiceError::Auth(Some(error)) => ApiError::Fail(StatusCode::UNAUTHORIZED, vec![error]),
            ServiceError::Auth(None) => ApiError::unauthorized("Unauthenticated"),
            ServiceError::Forbidden => ApiError::fail(StatusCode::FORBIDDEN, "Forbidden"),
            ServiceError::NotFound => ApiError::fail(StatusCode::NOT_FOUND, "Not found"),
            // Details are logged where the failure happened, not sent to clients
            ServiceError::Storage(_) => ApiError::internal("Storage error"),
            ServiceError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ApiError::internal("Internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid("query", rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::invalid("file", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::invalid("file", e.body_text())
    }
}

// ============================================================================
// Extractors with JSend rejections
// ============================================================================

/// `Json` whose rejection is a JSend fail envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejection is a JSend fail envelope
#[derive(axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// `Multipart` whose rejection is a JSend fail envelope
pub struct AppMultipart(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(AppMultipart)
            .map_err(ApiError::from)
    }
}
