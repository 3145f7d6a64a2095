use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::debug;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "Object not found",
            Error::Validation(_) => "Validation unsuccessful",
            Error::Storage(_) | Error::Codec(_) => "Internal server error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) | Error::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::NotFound(message) | Error::Validation(message) => message.clone(),
            Error::Storage(_) | Error::Codec(_) => {
                debug!("{:?}", self);
                "Database error".to_owned()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            message,
        })
    }
}
