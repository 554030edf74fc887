//! Axum extractor that deserialises and validates query strings

use crate::error::ApiError;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// An axum extractor based on the Query extractor that also performs validation using the
/// validator crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    /// Extract a `ValidatedQuery` from the request parts.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    // https://github.com/tokio-rs/axum/blob/main/examples/testing/src/main.rs

    use super::*;
    use axum::{
        body::Body,
        http::{self, Request, StatusCode},
        response::Response,
        routing::get,
        Router,
    };
    use regex::Regex;
    use serde::Deserialize;
    use tower::ServiceExt; // for `oneshot` and `ready`

    #[derive(Deserialize, Validate)]
    struct TestQuery {
        #[validate(length(min = 1, max = 3))]
        pub foo: String,
        pub bar: Option<u32>,
    }

    // Handler function that accepts a ValidatedQuery extractor.
    async fn test_handler(ValidatedQuery(query): ValidatedQuery<TestQuery>) -> String {
        format!("foo: {} bar: {:?}", query.foo, query.bar)
    }

    // Build a router and make a oneshot request.
    async fn request(uri: &str) -> Response {
        Router::new()
            .route("/", get(test_handler))
            .oneshot(
                Request::builder()
                    .method(http::Method::GET)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ok() {
        let response = request("/?foo=abc&bar=123").await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert_eq!(&body[..], "foo: abc bar: Some(123)");
    }

    #[tokio::test]
    async fn missing_foo() {
        let response = request("/?bar=123").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*request query is not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
        let re = Regex::new(r"missing field `foo`").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_bar_type() {
        let response = request("/?foo=abc&bar=x").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r"Failed to deserialize query string").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_foo_too_long() {
        let response = request("/?foo=abcd").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response).await;
        let re = Regex::new(r".*request query is not valid.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
        let re = Regex::new(r".*foo: Validation error: length.*").unwrap();
        assert!(re.is_match(&body[..]), "body: {body}");
    }
}
