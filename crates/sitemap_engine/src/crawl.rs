use std::io::Read;

use bytes::buf::Reader;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use sitemap_core::{Item, ItemKind, Location};
use sitemap_logging::{sitemap_debug, sitemap_error, sitemap_info, sitemap_warn};
use url::Url;

use crate::{
    parse_response, FetchError, FetchedSitemap, Fetcher, SitemapError, SitemapResponse,
    MAX_SITEMAP_BYTES,
};

/// Identifies the crawler to origin servers on every nested request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (SiteMap-Reader)";

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub user_agent: String,
    /// Deepest sitemap-index nesting that is still fetched; the entry document is depth 0.
    pub max_depth: usize,
    /// Decoded size limit applied to every fetched document.
    pub max_bytes: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_depth: 8,
            max_bytes: MAX_SITEMAP_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Leaf URLs delivered to the callback.
    pub urls: usize,
    /// Sitemap documents fetched and dispatched.
    pub sitemaps: usize,
    /// Nested fetch or dispatch failures that were skipped.
    pub failures: usize,
    /// Index entries not followed because of `max_depth`.
    pub depth_limited: usize,
}

/// Follows sitemap-index entries through a [`Fetcher`], delivering leaf URLs to a callback.
///
/// Branches are drained depth-first in document order. A failing nested sitemap is
/// logged and skipped; only the entry document can fail the crawl. Already-visited
/// sitemaps are not tracked, so cyclic indexes are only stopped by `max_depth`.
pub struct SitemapCrawler<F> {
    fetcher: F,
    settings: CrawlSettings,
}

impl<F: Fetcher> SitemapCrawler<F> {
    pub fn new(fetcher: F, settings: CrawlSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch `url` and crawl it. Errors of this first fetch and dispatch are returned.
    pub async fn crawl<C>(&self, url: &Url, on_url: &mut C) -> Result<CrawlStats, SitemapError>
    where
        C: FnMut(Item) + Send,
    {
        sitemap_info!("crawling sitemap {}", url);
        let response = match self.fetch(url).await {
            Ok(response) => response,
            Err(err) => {
                sitemap_error!("cannot fetch sitemap {}: {}", url, err);
                return Err(err.into());
            }
        };
        self.crawl_response(response, on_url).await
    }

    /// Run [`SitemapCrawler::crawl`] to completion on a dedicated tokio runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn crawl_blocking<C>(&self, url: &Url, on_url: &mut C) -> Result<CrawlStats, SitemapError>
    where
        C: FnMut(Item) + Send,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(SitemapError::Runtime)?;
        runtime.block_on(self.crawl(url, on_url))
    }

    /// Dispatch a response the caller already holds and follow its index entries.
    ///
    /// Leaf URLs reach `on_url` while the body is still being read, up to the
    /// first index entry. From there on items are queued so that each entry is
    /// drained before the items after it. Items parsed before a dispatch error
    /// are still delivered (and followed) before the error is returned.
    pub async fn crawl_response<R, C>(
        &self,
        response: SitemapResponse<R>,
        on_url: &mut C,
    ) -> Result<CrawlStats, SitemapError>
    where
        R: Read + Send,
        C: FnMut(Item) + Send,
    {
        let mut stats = CrawlStats {
            sitemaps: 1,
            ..CrawlStats::default()
        };
        let (queued, result) = dispatch(response, &mut *on_url, &mut stats);
        for item in queued {
            self.follow(item, &mut *on_url, 0, &mut stats).await;
        }
        result.map(|()| stats)
    }

    /// Route one discovered item: leaf URLs go to `on_url`, index entries are fetched and crawled.
    pub async fn handle_item<C>(&self, item: Item, on_url: &mut C) -> CrawlStats
    where
        C: FnMut(Item) + Send,
    {
        let mut stats = CrawlStats::default();
        self.follow(item, on_url, 0, &mut stats).await;
        stats
    }

    fn follow<'a, C>(
        &'a self,
        item: Item,
        on_url: &'a mut C,
        depth: usize,
        stats: &'a mut CrawlStats,
    ) -> BoxFuture<'a, ()>
    where
        C: FnMut(Item) + Send,
    {
        Box::pin(async move {
            match item.kind {
                ItemKind::LeafUrl => {
                    stats.urls += 1;
                    on_url(item);
                }
                ItemKind::IndexEntry => {
                    self.follow_index(item.location, on_url, depth + 1, stats)
                        .await;
                }
            }
        })
    }

    async fn follow_index<C>(
        &self,
        location: Location,
        on_url: &mut C,
        depth: usize,
        stats: &mut CrawlStats,
    ) where
        C: FnMut(Item) + Send,
    {
        if depth > self.settings.max_depth {
            sitemap_warn!(
                "not following {}: depth limit {} reached",
                location,
                self.settings.max_depth
            );
            stats.depth_limited += 1;
            return;
        }

        let url = match location.to_url() {
            Ok(url) => url,
            Err(err) => {
                sitemap_warn!("skipping nested sitemap {}: {}", location, err);
                stats.failures += 1;
                return;
            }
        };

        let response = match self.fetch(&url).await {
            Ok(response) => response,
            Err(err) => {
                sitemap_warn!("skipping nested sitemap {}: {}", url, err);
                stats.failures += 1;
                return;
            }
        };
        stats.sitemaps += 1;

        let (queued, result) = dispatch(response, &mut *on_url, &mut *stats);
        if let Err(err) = result {
            sitemap_warn!("nested sitemap {} failed: {}", url, err);
            stats.failures += 1;
        }
        sitemap_debug!("nested sitemap {} queued {} entries", url, queued.len());

        for item in queued {
            self.follow(item, &mut *on_url, depth, &mut *stats).await;
        }
    }

    async fn fetch(&self, url: &Url) -> Result<SitemapResponse<Reader<Bytes>>, FetchError> {
        let headers = [("User-Agent", self.settings.user_agent.as_str())];
        let fetched: FetchedSitemap = self.fetcher.fetch(url, &headers).await?;
        Ok(fetched.into_response().with_max_bytes(self.settings.max_bytes))
    }
}

/// Parse one document, handing leaf URLs straight to `on_url` until the first
/// index entry shows up. That entry and everything after it is returned in
/// document order for the caller to follow.
fn dispatch<R, C>(
    response: SitemapResponse<R>,
    on_url: &mut C,
    stats: &mut CrawlStats,
) -> (Vec<Item>, Result<(), SitemapError>)
where
    R: Read,
    C: FnMut(Item),
{
    let mut queued = Vec::new();
    let result = parse_response(response, |item| {
        if queued.is_empty() && item.kind == ItemKind::LeafUrl {
            stats.urls += 1;
            on_url(item);
        } else {
            queued.push(item);
        }
    });
    (queued, result)
}
