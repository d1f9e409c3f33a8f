use std::cell::Cell;
use std::io::{self, BufRead, BufReader, Read};

use flate2::bufread::MultiGzDecoder;
use sitemap_core::{normalize_location, parse_stream_plain, parse_stream_xml, Item, ParseError};
use sitemap_logging::sitemap_debug;
use thiserror::Error;
use url::Url;

use crate::FetchError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Protocol limit for an uncompressed sitemap.
pub const MAX_SITEMAP_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to open gzip stream: {0}")]
    Decompress(#[source] io::Error),
    #[error("unrecognized content type {content_type:?} for {path}")]
    UnrecognizedContentType {
        content_type: Option<String>,
        path: String,
    },
    #[error("decoded sitemap exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// A response to dispatch: where it came from, its content hints and its body.
#[derive(Debug)]
pub struct SitemapResponse<R> {
    pub source_url: Url,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// Most decoded (decompressed) bytes read from `body`.
    pub max_bytes: u64,
    pub body: R,
}

impl<R: Read> SitemapResponse<R> {
    pub fn new(source_url: Url, body: R) -> Self {
        Self {
            source_url,
            content_type: None,
            content_encoding: None,
            max_bytes: MAX_SITEMAP_BYTES,
            body,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_encoding(mut self, content_encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(content_encoding.into());
        self
    }

    fn is_gzipped(&self) -> bool {
        self.source_url.path().contains(".gz")
            || self
                .content_encoding
                .as_deref()
                .is_some_and(|encoding| encoding.to_ascii_lowercase().contains("gzip"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Xml,
    Plain,
}

/// Pick the reader from the content-type hint, falling back to the last path segment.
pub fn detect_format(content_type: Option<&str>, url: &Url) -> Option<BodyFormat> {
    let mime = content_type.unwrap_or_default().to_ascii_lowercase();
    let base_name = url.path().rsplit('/').next().unwrap_or_default();

    if mime.contains("xml") || base_name.contains(".xml") {
        Some(BodyFormat::Xml)
    } else if mime.contains("plain") || base_name.contains(".txt") {
        Some(BodyFormat::Plain)
    } else {
        None
    }
}

/// Decompress if needed, pick the XML or plain reader, and hand every item to
/// `callback` after normalizing its location against the response URL.
///
/// Reading stops with [`SitemapError::TooLarge`] once the decoded body passes
/// `max_bytes`; items parsed before that point are still delivered.
pub fn parse_response<R, F>(response: SitemapResponse<R>, mut callback: F) -> Result<(), SitemapError>
where
    R: Read,
    F: FnMut(Item),
{
    let gzipped = response.is_gzipped();
    let SitemapResponse {
        source_url,
        content_type,
        max_bytes,
        body,
        ..
    } = response;

    let decoded: Box<dyn Read + '_> = if gzipped {
        open_gzip(body)?
    } else {
        Box::new(body)
    };

    let Some(format) = detect_format(content_type.as_deref(), &source_url) else {
        return Err(SitemapError::UnrecognizedContentType {
            content_type,
            path: source_url.path().to_string(),
        });
    };
    sitemap_debug!("parsing {} as {:?} (gzip: {})", source_url, format, gzipped);

    let normalized = |mut item: Item| {
        normalize_location(&mut item.location, &source_url);
        callback(item);
    };

    let exceeded = Cell::new(false);
    let reader = SizeLimit {
        inner: decoded,
        remaining: max_bytes,
        exceeded: &exceeded,
    };
    let parsed = match format {
        BodyFormat::Xml => parse_stream_xml(reader, normalized),
        BodyFormat::Plain => {
            parse_stream_plain(reader, normalized);
            Ok(())
        }
    };
    if exceeded.get() {
        return Err(SitemapError::TooLarge { max_bytes });
    }
    parsed?;
    Ok(())
}

/// Fails the read once more than the allowed number of bytes has been seen.
struct SizeLimit<'a, R> {
    inner: R,
    remaining: u64,
    exceeded: &'a Cell<bool>,
}

impl<R: Read> Read for SizeLimit<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            // Only the end of the stream is allowed past the limit.
            let mut probe = [0u8; 1];
            return match self.inner.read(&mut probe)? {
                0 => Ok(0),
                _ => {
                    self.exceeded.set(true);
                    Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "decoded sitemap too large",
                    ))
                }
            };
        }
        let cap = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..cap])?;
        self.remaining -= read as u64;
        Ok(read)
    }
}

fn open_gzip<'a, R: Read + 'a>(body: R) -> Result<Box<dyn Read + 'a>, SitemapError> {
    let mut reader = BufReader::new(body);
    let header = reader.fill_buf().map_err(SitemapError::Decompress)?;
    let matches = if header.len() < GZIP_MAGIC.len() {
        !header.is_empty() && GZIP_MAGIC.starts_with(header)
    } else {
        header.starts_with(&GZIP_MAGIC)
    };
    if !matches {
        return Err(SitemapError::Decompress(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing gzip header",
        )));
    }
    Ok(Box::new(MultiGzDecoder::new(reader)))
}
