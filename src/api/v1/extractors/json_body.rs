/*
 * Responsibility
 * - `Json<T>` with rejections rendered as AppError (400 + error body) instead of axum's
 *   plain-text 415/422 responses
 */
use axum::Json;
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use serde::de::DeserializeOwned;

use crate::error::AppError;

#[derive(Debug)]
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
            Err(rejection) => Err(reject(rejection)),
        }
    }
}

fn reject(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "json body rejected");
    AppError::bad_request("INVALID_JSON", rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flag {
        on: bool,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn parses_valid_json() {
        let JsonBody(flag) = JsonBody::<Flag>::from_request(json_request(r#"{"on":true}"#), &())
            .await
            .unwrap();
        assert!(flag.on);
    }

    #[tokio::test]
    async fn wrong_type_is_400() {
        let err = JsonBody::<Flag>::from_request(json_request(r#"{"on":"yes"}"#), &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
