use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::domain::order::OrderError;
use crate::domain::product::ProductError;
use crate::storage::StoreError;

use super::response::ApiResponse;

/// Domain error translated for the HTTP boundary. Store failures are logged
/// here and answered with a generic message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    fn internal(error: &StoreError) -> Self {
        tracing::error!(error = %error, "Storage failure while handling request");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiResponse::empty(&self.message))
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        match &error {
            OrderError::Unprocessable | OrderError::InvalidStatusTransition { .. } => {
                Self::unprocessable(error.to_string())
            }
            OrderError::NotFound(_) => Self::not_found(error.to_string()),
            OrderError::EmptyItems
            | OrderError::InvalidQuantity(_)
            | OrderError::MissingField(_) => Self::bad_request(error.to_string()),
            OrderError::Store(e) => Self::internal(e),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(error: ProductError) -> Self {
        match &error {
            ProductError::NotFound(_) => Self::not_found(error.to_string()),
            ProductError::EmptyName
            | ProductError::NegativeQuantity(_)
            | ProductError::NegativePrice => Self::bad_request(error.to_string()),
            ProductError::Store(e) => Self::internal(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::internal(&error)
    }
}
