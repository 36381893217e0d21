use actix_web::HttpResponse;
use serde::Serialize;

/// Envelope shared by every endpoint: `{ "data": ..., "message": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> HttpResponse {
        Self::with_message(data, "Success")
    }

    pub fn with_message(data: T, message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            data: Some(data),
            message: message.to_string(),
        })
    }

    pub fn created(data: T, message: &str) -> HttpResponse {
        HttpResponse::Created().json(Self {
            data: Some(data),
            message: message.to_string(),
        })
    }
}

impl ApiResponse<()> {
    /// `data: null` with a message, for deletions and errors
    pub fn empty(message: &str) -> Self {
        Self {
            data: None,
            message: message.to_string(),
        }
    }
}
