//! HTTP handlers. Errors are `(StatusCode, String)` tuples straight to the
//! caller; axum renders them as plain-text responses.

pub mod chat;
pub mod config;
pub mod conversations;
pub mod search;

use axum::http::StatusCode;

use crate::error::Error;

pub type ApiError = (StatusCode, String);

pub(crate) fn to_api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::PipelineNotReady => StatusCode::SERVICE_UNAVAILABLE,
        Error::UnknownConversation(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            to_api_error(Error::PipelineNotReady).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            to_api_error(Error::UnknownConversation("x".into())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            to_api_error(Error::InvalidInput("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            to_api_error(Error::Store(StoreError::Query("boom".into()))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
