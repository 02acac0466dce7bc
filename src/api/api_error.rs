use crate::error::Error;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let any_err = self.0;
        let status = match any_err.downcast_ref::<Error>() {
            Some(Error::Forbidden(_)) => StatusCode::FORBIDDEN,
            Some(Error::MissingParam(_) | Error::UnknownHook(_)) => StatusCode::BAD_REQUEST,
            _ => match any_err.downcast_ref::<FormRejection>() {
                Some(FormRejection::InvalidFormContentType(_)) => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                Some(
                    FormRejection::FailedToDeserializeForm(_)
                    | FormRejection::FailedToDeserializeFormBody(_),
                ) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        let body = Json(json!({
            "error": format!("{any_err}"),
        }));
        (status, body).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
