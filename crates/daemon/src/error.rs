use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::protocol::ErrorBody;
use thiserror::Error;
use tracing::{error, warn};

/// Non-2xx reply from one of the upstream APIs. Kept as a typed error so
/// the HTTP edge can pass the upstream status through.
#[derive(Debug, Error)]
#[error("{service} API error: {status} - {body}")]
pub struct UpstreamError {
    pub service: &'static str,
    pub status: u16,
    pub body: String,
}

/// Returns the response unchanged if it is 2xx, otherwise an
/// `UpstreamError` carrying the status and body text.
pub async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(UpstreamError {
        service,
        status: status.as_u16(),
        body,
    }
    .into())
}

/// The media service has no video with this id.
#[derive(Debug, Error)]
#[error("video {0} not found")]
pub struct VideoNotFound(pub String);

/// Turns an upstream 404 into `VideoNotFound`; other errors pass through.
pub fn video_not_found(err: anyhow::Error, video_id: &str) -> anyhow::Error {
    match err.downcast_ref::<UpstreamError>() {
        Some(upstream) if upstream.status == 404 => VideoNotFound(video_id.to_string()).into(),
        _ => err,
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<VideoNotFound>() {
            Some(missing) => ApiError::NotFound(missing.to_string()),
            None => ApiError::Internal(err),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(e) => e
                .downcast_ref::<UpstreamError>()
                .and_then(|u| StatusCode::from_u16(u.status).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => format!("{e:#}"),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(%status, %detail, "request failed");
        } else {
            warn!(%status, %detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_passes_through() {
        let err = ApiError::from(anyhow::Error::from(UpstreamError {
            service: "OpenRouter",
            status: 429,
            body: "rate limited".into(),
        }));
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn wrapped_upstream_error_is_still_found() {
        let err = anyhow::Error::from(UpstreamError {
            service: "VideoDB",
            status: 404,
            body: "no such video".into(),
        })
        .context("loading video m-1");
        assert_eq!(ApiError::from(err).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_video_becomes_not_found() {
        let err = anyhow::Error::from(VideoNotFound("m-9".into())).context("trimming");
        let api = ApiError::from(err);
        assert!(matches!(&api, ApiError::NotFound(detail) if detail == "video m-9 not found"));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);

        let upstream = anyhow::Error::from(UpstreamError {
            service: "VideoDB",
            status: 404,
            body: "{}".into(),
        });
        assert!(video_not_found(upstream, "m-9").is::<VideoNotFound>());
    }

    #[test]
    fn plain_errors_are_500() {
        let err = ApiError::from(anyhow::anyhow!("VIDEODB_API_KEY environment variable not set"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::BadRequest("url is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
