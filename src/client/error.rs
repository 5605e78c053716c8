use crate::api::schemas::error::ErrorBody;
use crate::domain::validation::FieldError;
use reqwest::StatusCode;
use thiserror::Error;

pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Errors surfaced to callers of the client.
///
/// Transport failures where no response was received are normalized into
/// [`ClientError::Unreachable`]; every HTTP error status keeps the server's
/// status and message.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String, fields: Vec<FieldError> },
    #[error("invalid request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Classifies an error returned by `send()`: anything but a builder error means
    /// the request never produced a response.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() { Self::Request(err) } else { Self::Unreachable(err) }
    }

    /// Builds an `Api` error from a non-success response, using the JSON error body when present.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_parts(status, &body)
    }

    pub(crate) fn from_parts(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error, fields }) => Self::Api { status, message: error, fields },
            Err(_) => Self::Api {
                status,
                message: status.canonical_reason().unwrap_or("Request failed").to_string(),
                fields: Vec::new(),
            },
        }
    }

    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Api { fields, .. } => fields,
            _ => &[],
        }
    }

    /// The login form's 401: the server's message is replaced with a credentials hint.
    pub(crate) fn into_login_error(self) -> Self {
        match self {
            Self::Api { status, fields, .. } if status == StatusCode::UNAUTHORIZED => {
                Self::Api { status, message: INVALID_CREDENTIALS_MESSAGE.to_string(), fields }
            }
            other => other,
        }
    }

    /// Message suitable for showing next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Request(_) | Self::InvalidBaseUrl(_) | Self::Encode(_) | Self::Decode(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}
