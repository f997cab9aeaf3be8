use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flagdesk_core::error::DeskError;
use serde::de::DeserializeOwned;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 400 errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain for request
/// problems that have no `DeskError` variant.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    /// Turn a failed `spawn_blocking` join into a 500.
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

// ---------------------------------------------------------------------------
// JSON request bodies
// ---------------------------------------------------------------------------

/// `Json` extractor whose rejections answer with the `{"error": …}` shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

fn status_for(err: &DeskError) -> StatusCode {
    match err {
        DeskError::RecordNotFound(_) | DeskError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
        DeskError::DuplicateUrl(_) | DeskError::FlagConflict(_) => StatusCode::CONFLICT,
        DeskError::MalformedImport(_)
        | DeskError::InvalidUrl(_)
        | DeskError::UnknownCategory(_)
        | DeskError::InvalidAction(_)
        | DeskError::InvalidRecordId(_)
        | DeskError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
        DeskError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DeskError::Io(_) | DeskError::Yaml(_) | DeskError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<DeskError>() {
            Some(e) => status_for(e),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!("request failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: DeskError) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn record_not_found_maps_to_404() {
        assert_eq!(status(DeskError::RecordNotFound("w1".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn template_not_found_maps_to_404() {
        assert_eq!(
            status(DeskError::TemplateNotFound("workerstatus".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn duplicate_url_maps_to_409() {
        assert_eq!(
            status(DeskError::DuplicateUrl("https://x.com".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn flag_conflict_maps_to_409() {
        assert_eq!(status(DeskError::FlagConflict("w1".into())), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_input_maps_to_400() {
        assert_eq!(status(DeskError::InvalidAction("ban".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(DeskError::InvalidUrl("".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(DeskError::InvalidInterval(1)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DeskError::MalformedImport("not json".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(DeskError::UnknownCategory("Games".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_unavailable_maps_to_503() {
        assert_eq!(
            status(DeskError::StoreUnavailable("offline".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        assert_eq!(status(DeskError::Io(io_err)), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let err = AppError::bad_request("body must be JSON");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError(DeskError::RecordNotFound("w1".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
