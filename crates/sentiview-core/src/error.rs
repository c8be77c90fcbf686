#![forbid(unsafe_code)]

//! Error types shared across the controller.

use crate::triple::Category;
use crate::view::ViewPhase;

/// A probability field that is neither a number nor the empty sentinel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{} value {value:?} is not a number", category.wire_name())]
    NotANumber { category: Category, value: String },
}

/// Failure talking to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("endpoint answered with HTTP {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// View controller failure.
#[derive(Debug, thiserror::Error)]
pub enum ViewError<E: std::error::Error + 'static> {
    #[error("dom operation failed: {0}")]
    Dom(#[source] E),
    #[error("cannot {transition} while in phase {phase:?}")]
    InvalidTransition {
        transition: &'static str,
        phase: ViewPhase,
    },
}

/// Page configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid page config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("page config field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("fade delay must be greater than zero")]
    ZeroFadeDelay,
}
