//! Sitemap engine: response dispatch, fetching and recursive sitemap-index crawling.
mod crawl;
mod dispatch;
mod fetch;
mod types;

pub use crawl::{CrawlSettings, CrawlStats, SitemapCrawler, DEFAULT_USER_AGENT};
pub use dispatch::{
    detect_format, parse_response, BodyFormat, SitemapError, SitemapResponse, MAX_SITEMAP_BYTES,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use types::{FailureKind, FetchError, FetchedSitemap};

pub use sitemap_core::{Item, ItemKind, Location};
