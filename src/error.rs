use std::error::Error;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::article::error::ArticleError;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Article not found")]
    ArticleNotFound,

    #[error("Image not found")]
    ImageNotFound,

    #[error(transparent)]
    Refresh(#[from] ArticleError),

    #[error("Refresh task did not complete")]
    Join(#[from] JoinError),
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = match self {
            RestError::ArticleNotFound => StatusCode::NOT_FOUND,
            RestError::ImageNotFound => StatusCode::NOT_FOUND,
            RestError::Refresh(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("{}: {:?}", self, self.source());
        }

        let payload = Json(json!({"error": self.to_string()}));

        (status, payload).into_response()
    }
}

pub type Result<T, E = RestError> = std::result::Result<T, E>;
