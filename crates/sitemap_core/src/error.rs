use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read sitemap stream: {0}")]
    Io(#[from] io::Error),
}

/// Why a `loc` value (or a plain-list line) is not a usable URI reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("empty location")]
    Empty,
    #[error("forbidden character {0:?} in location")]
    ForbiddenChar(char),
    #[error("invalid scheme {0:?}")]
    InvalidScheme(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("invalid percent-escape in {0:?}")]
    InvalidEscape(String),
    #[error("not a valid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Reason an element was closed without producing an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementRejection {
    #[error("element has no loc field")]
    MissingLocation,
    #[error("element loc is not a valid URI reference: {0}")]
    InvalidLocation(#[from] LocationError),
}
