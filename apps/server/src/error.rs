use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use moex_quote_cache::{AlertError, CacheError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Cache(#[from] CacheError),
    #[error("{0}")]
    Alert(#[from] AlertError),
    #[error("Not Found")]
    NotFound,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Cache(e) => match e {
                CacheError::DataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                CacheError::StoreWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Alert(e) => match e {
                AlertError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                AlertError::NotFound(_) => StatusCode::NOT_FOUND,
                AlertError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
