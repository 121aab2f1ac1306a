use axum::{
  extract::rejection::QueryRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("Validation error: {0}")]
  ValidationError(String),

  #[error("Upstream error: {0}")]
  UpstreamError(String),

  #[error("Parse error: {0}")]
  ParseError(String),

  #[error("Config error: {0}")]
  ConfigError(String),

  #[error("Internal server error: {0}")]
  InternalError(String),
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
      match self {
          AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
          AppError::UpstreamError(_)
          | AppError::ParseError(_)
          | AppError::ConfigError(_)
          | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
      }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
      if err.is_decode() {
          Self::ParseError(err.to_string())
      } else {
          Self::UpstreamError(err.to_string())
      }
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
      Self::ParseError(err.to_string())
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(err: validator::ValidationErrors) -> Self {
      Self::ValidationError(err.to_string())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
      Self::ValidationError(rejection.body_text())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
      let status = self.status_code();
      let error_message = match self {
          AppError::ConfigError(_) => "A configuration error occurred".to_string(),
          other => other.to_string(),
      };

      let body = Json(json!({
          "error": error_message,
      }));

      (status, body).into_response()
  }
}
