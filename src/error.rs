//! Error types for the admission server

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};

use crate::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("{0}")]
  BadRequest(String),

  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Database(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let message = match &self {
      Error::BadRequest(message) => message.as_str(),
      Error::Database(_) | Error::Internal(_) => {
        error!("Error validating license: {self}");
        "Server error"
      }
    };

    let body = json::json!({
      "valid": false,
      "message": message,
    });

    (self.status(), Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
