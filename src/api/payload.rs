//! Request extractors whose rejections answer with the JSON error body.
//!
//! [`Payload`] accepts JSON and form-encoded bodies. [`PathParam`] and
//! [`QueryParams`] wrap axum's `Path` and `Query` so a bad segment or query
//! string is a `400 INVALID_INPUT` like every other client error.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::{async_trait, Form};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DeskError;

/// A decoded request body
///
/// - `application/json` (or `+json`): parsed as JSON; an empty body, or a
///   value that is not an object (`[]`, `"text"`, `null`), is `{}`
/// - `application/x-www-form-urlencoded`: parsed as a form
/// - anything else, or no content type: the body is ignored and `T::default()` is used,
///   so declared validation rules report the fields as missing
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = DeskError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type == "application/x-www-form-urlencoded" {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| DeskError::invalid_body(rejection.body_text()))?;
            return Ok(Self(value));
        }

        if content_type == "application/json" || content_type.ends_with("+json") {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| DeskError::invalid_body(rejection.body_text()))?;

            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Self(T::default()));
            }

            let value: Value =
                serde_json::from_slice(&bytes).map_err(|e| DeskError::invalid_body(e.to_string()))?;
            if !value.is_object() {
                return Ok(Self(T::default()));
            }

            return serde_json::from_value(value)
                .map(Self)
                .map_err(|e| DeskError::invalid_body(e.to_string()));
        }

        Ok(Self(T::default()))
    }
}

/// A decoded path segment
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = DeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| DeskError::invalid_input(rejection.body_text()))
    }
}

/// A decoded query string
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = DeskError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| DeskError::invalid_input(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::requests::AgentRename;
    use crate::validation::FieldValue;
    use axum::body::Body;

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<AgentRename, DeskError> {
        let mut builder = Request::builder().method("PUT").uri("/agent");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body)).unwrap();
        Payload::<AgentRename>::from_request(req, &()).await.map(|Payload(value)| value)
    }

    #[tokio::test]
    async fn test_json_body() {
        let rename = extract(Some("application/json; charset=utf-8"), r#"{"AGENT_CODE":"A019"}"#)
            .await
            .unwrap();
        assert_eq!(rename.agent_code, Some(FieldValue::from("A019")));
        assert_eq!(rename.agent_name, None);
    }

    #[tokio::test]
    async fn test_form_body() {
        let rename = extract(
            Some("application/x-www-form-urlencoded"),
            "AGENT_CODE=A019&AGENT_NAME=Jyo",
        )
        .await
        .unwrap();
        assert_eq!(rename.agent_name, Some(FieldValue::from("Jyo")));
    }

    #[tokio::test]
    async fn test_empty_json_body_is_default() {
        let rename = extract(Some("application/json"), "").await.unwrap();
        assert_eq!(rename, AgentRename::default());
    }

    #[tokio::test]
    async fn test_unknown_content_type_is_default() {
        let rename = extract(Some("text/plain"), "AGENT_CODE=A019").await.unwrap();
        assert_eq!(rename, AgentRename::default());

        let rename = extract(None, r#"{"AGENT_CODE":"A019"}"#).await.unwrap();
        assert_eq!(rename, AgentRename::default());
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_body() {
        let err = extract(Some("application/json"), "{\"AGENT_CODE\":").await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_non_object_json_is_default() {
        for body in ["[]", "\"A019\"", "null", "42"] {
            let rename = extract(Some("application/json"), body).await.unwrap();
            assert_eq!(rename, AgentRename::default(), "body {body}");
        }
    }

    #[tokio::test]
    async fn test_repeated_query_key_is_invalid_input() {
        use crate::api::requests::OrderFilter;

        let req = Request::builder().uri("/orders?amount=1&amount=2").body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = QueryParams::<OrderFilter>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
