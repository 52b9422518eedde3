//! Request extractors
//!
//! Each request body type declares its required fields with `validator`
//! attributes and the single message to answer with when any of them is
//! missing, empty or of the wrong type. Query strings are only ever used as
//! optional filters and never reject a request.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use super::error::ApiError;

/// Fixed 400 message of a request body type
pub trait RequiredFields {
    const MESSAGE: &'static str;
}

/// JSON body that has passed its field requirements
///
/// The `Content-Type` header is not checked.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + RequiredFields,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            debug!(%rejection, "failed to read request body");
            ApiError::BadRequest(T::MESSAGE)
        })?;

        let value: T = serde_json::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "request body does not match");
            ApiError::BadRequest(T::MESSAGE)
        })?;

        value.validate().map_err(|e| {
            debug!(error = %e, "request body failed validation");
            ApiError::BadRequest(T::MESSAGE)
        })?;

        Ok(Self(value))
    }
}

/// Query string filters; the first value of a repeated key wins
///
/// An undecodable query string counts as empty.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Value of `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key`, empty when absent
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut params = HashMap::new();
        for (key, value) in pairs {
            params.entry(key.into()).or_insert_with(|| value.into());
        }
        Self(params)
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = match Query::<Vec<(String, String)>>::from_request_parts(parts, state).await {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                debug!(%rejection, "ignoring undecodable query string");
                Vec::new()
            }
        };
        Ok(pairs.into_iter().collect())
    }
}
