use thiserror::Error;

use crate::discounts::NewDiscountBuilderError;

#[derive(Debug, Error)]
pub enum GetError {
    #[error("the request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("the request failed with status code: {0}")]
    ResponseError(reqwest::StatusCode),
    #[error("the response body could not be read: {0}")]
    ResponseBodyError(#[source] reqwest::Error),
    #[error("unable to parse the response body: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GetError {
    /// Numeric status code, when the failure came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            GetError::ResponseError(status) => Some(status.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("unable to build the request: {0}")]
    BuildError(#[from] NewDiscountBuilderError),
    #[error("the request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("the request failed with status code: {0}")]
    ResponseError(reqwest::StatusCode),
    #[error("the response body could not be read: {0}")]
    ResponseBodyError(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("the generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("the generation request failed with status code: {0}")]
    ResponseError(reqwest::StatusCode),
    #[error("the generation response body could not be read: {0}")]
    ResponseBodyError(#[source] reqwest::Error),
    #[error("unable to parse the generation response: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("the generation response is malformed: {0}")]
    MalformedEnvelope(&'static str),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("the login request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("unable to serialize the request: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no token received in response")]
    MissingToken,
    #[error("the session relay rejected the token with status code: {0}")]
    RelayError(reqwest::StatusCode),
    #[error("unable to persist the token: {0}")]
    PersistError(#[from] SaveError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read the file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("unable to parse the file: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unable to write the file: {0}")]
    WriteError(#[from] std::io::Error),
    #[error("unable to serialize the data: {0}")]
    SerializeError(#[from] serde_json::Error),
}
