use std::fmt;

use bytes::{Buf, Bytes};
use url::Url;

use crate::{SitemapResponse, MAX_SITEMAP_BYTES};

/// A fetched sitemap document, body still in its transfer form (possibly gzip).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSitemap {
    /// URL the body was served from, after redirects.
    pub source_url: Url,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub body: Bytes,
}

impl FetchedSitemap {
    pub fn into_response(self) -> SitemapResponse<bytes::buf::Reader<Bytes>> {
        SitemapResponse {
            source_url: self.source_url,
            content_type: self.content_type,
            content_encoding: self.content_encoding,
            max_bytes: MAX_SITEMAP_BYTES,
            body: self.body.reader(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
