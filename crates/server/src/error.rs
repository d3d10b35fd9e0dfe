use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_core::FolioError;
use serde::Serialize;

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failure ready to be sent to the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

/// Upstream statuses are echoed only when they are valid error codes.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<FolioError> for AppError {
    fn from(err: FolioError) -> Self {
        let status = match &err {
            FolioError::InvalidInput(_) | FolioError::ExtractionFailed => StatusCode::BAD_REQUEST,
            FolioError::Fetch { status, .. } => upstream_status(*status),
            FolioError::HttpError(_) => StatusCode::BAD_GATEWAY,
            FolioError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FolioError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FolioError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(stage = %err.stage(), error = %err, "extraction failed");
        } else {
            tracing::warn!(stage = %err.stage(), error = %err, "extraction rejected");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        Self { status, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Stage;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (FolioError::InvalidInput("URL is required".into()), StatusCode::BAD_REQUEST),
            (FolioError::ExtractionFailed, StatusCode::BAD_REQUEST),
            (FolioError::Fetch { status: Some(404), message: "Not Found".into() }, StatusCode::NOT_FOUND),
            (FolioError::Fetch { status: Some(503), message: "Unavailable".into() }, StatusCode::SERVICE_UNAVAILABLE),
            (FolioError::Fetch { status: None, message: "reset".into() }, StatusCode::BAD_GATEWAY),
            (FolioError::Timeout { timeout: 30 }, StatusCode::GATEWAY_TIMEOUT),
            (FolioError::BodyTooLarge { limit: 10 }, StatusCode::PAYLOAD_TOO_LARGE),
            (FolioError::UnsupportedContentType("application/pdf".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (FolioError::Cancelled { stage: Stage::Fetch }, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status, expected);
        }
    }

    #[test]
    fn test_upstream_success_status_is_not_echoed() {
        let err = FolioError::Fetch { status: Some(200), message: "odd".into() };
        assert_eq!(AppError::from(err).status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::from(FolioError::HtmlParseError("rewriter state machine exploded".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
