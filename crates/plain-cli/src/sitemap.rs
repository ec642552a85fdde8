//! Sitemap retrieval and XML parsing.
//!
//! Handles both `<urlset>` documents and `<sitemapindex>` documents; nested
//! sitemaps are expanded depth first so the final list keeps document order.

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

/// Deepest `<sitemapindex>` nesting that is still expanded.
pub(crate) const MAX_SITEMAP_DEPTH: usize = 3;

/// Errors raised while fetching or parsing a sitemap.
#[derive(Debug, Error)]
pub(crate) enum SitemapError {
    #[error("request to {url} failed: {source}")]
    Request { url: Url, source: reqwest::Error },
    #[error("{url} returned status {status}")]
    Status { url: Url, status: StatusCode },
    #[error("malformed sitemap XML: {source}")]
    Xml { source: quick_xml::Error },
    #[error("unexpected root element <{name}>")]
    UnexpectedRoot { name: String },
    #[error("sitemap document has no root element")]
    EmptyDocument,
    #[error("sitemap document ended inside <{open}>")]
    Truncated { open: String },
}

/// Produces the page URLs listed by a sitemap.
#[async_trait]
pub(crate) trait SitemapSource: Send + Sync {
    async fn fetch(&self, sitemap_url: &Url) -> Result<Vec<Url>, SitemapError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SitemapKind {
    UrlSet,
    Index,
}

/// `<loc>` entries of one sitemap document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedSitemap {
    pub(crate) kind: SitemapKind,
    pub(crate) locations: Vec<String>,
}

/// Parse a sitemap or sitemap index document.
pub(crate) fn parse_sitemap(xml: &str) -> Result<ParsedSitemap, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut kind = None;
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current_loc: Option<String> = None;
    let mut locations = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|source| SitemapError::Xml { source })?
        {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                if path.is_empty() {
                    kind = Some(root_kind(&name)?);
                }
                if name == b"loc" && in_entry(&path) {
                    current_loc = Some(String::new());
                }
                path.push(name);
            }
            Event::Empty(element) => {
                if path.is_empty() {
                    kind = Some(root_kind(element.local_name().as_ref())?);
                }
            }
            Event::Text(text) => {
                if let Some(loc) = current_loc.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|source| SitemapError::Xml { source })?;
                    loc.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if path.pop().as_deref() == Some(b"loc".as_slice())
                    && let Some(loc) = current_loc.take()
                {
                    let trimmed = loc.trim();
                    if !trimmed.is_empty() {
                        locations.push(trimmed.to_string());
                    }
                }
            }
            Event::Eof => {
                if let Some(open) = path.last() {
                    return Err(SitemapError::Truncated {
                        open: String::from_utf8_lossy(open).into_owned(),
                    });
                }
                break;
            }
            _ => {}
        }
    }

    let kind = kind.ok_or(SitemapError::EmptyDocument)?;
    Ok(ParsedSitemap { kind, locations })
}

fn root_kind(name: &[u8]) -> Result<SitemapKind, SitemapError> {
    match name {
        b"urlset" => Ok(SitemapKind::UrlSet),
        b"sitemapindex" => Ok(SitemapKind::Index),
        other => Err(SitemapError::UnexpectedRoot {
            name: String::from_utf8_lossy(other).into_owned(),
        }),
    }
}

/// True when the open element is a `<url>` or `<sitemap>` directly under the root.
fn in_entry(path: &[Vec<u8>]) -> bool {
    path.len() == 2 && matches!(path[1].as_slice(), b"url" | b"sitemap")
}

/// Fetches sitemaps over HTTP, following sitemap indexes.
#[derive(Clone)]
pub(crate) struct HttpSitemapSource {
    client: Client,
    max_depth: usize,
}

impl HttpSitemapSource {
    pub(crate) const fn new(client: Client) -> Self {
        Self {
            client,
            max_depth: MAX_SITEMAP_DEPTH,
        }
    }

    async fn fetch_document(&self, url: &Url) -> Result<ParsedSitemap, SitemapError> {
        debug!(sitemap = %url, "fetching sitemap");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SitemapError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SitemapError::Request {
                url: url.clone(),
                source,
            })?;
        parse_sitemap(&body)
    }

    fn absorb(
        &self,
        document: ParsedSitemap,
        depth: usize,
        urls: &mut Vec<Url>,
        pending: &mut Vec<(Url, usize)>,
    ) {
        let resolved = resolve_locations(document.locations);
        match document.kind {
            SitemapKind::UrlSet => urls.extend(resolved),
            SitemapKind::Index if depth >= self.max_depth => {
                warn!(
                    depth,
                    skipped = resolved.len(),
                    "sitemap index nested too deeply; skipping children"
                );
            }
            SitemapKind::Index => {
                pending.extend(resolved.into_iter().rev().map(|url| (url, depth + 1)));
            }
        }
    }
}

#[async_trait]
impl SitemapSource for HttpSitemapSource {
    async fn fetch(&self, sitemap_url: &Url) -> Result<Vec<Url>, SitemapError> {
        let root = self.fetch_document(sitemap_url).await?;

        let mut urls = Vec::new();
        let mut pending = Vec::new();
        self.absorb(root, 0, &mut urls, &mut pending);

        while let Some((nested, depth)) = pending.pop() {
            match self.fetch_document(&nested).await {
                Ok(document) => self.absorb(document, depth, &mut urls, &mut pending),
                Err(err) => warn!(sitemap = %nested, error = %err, "skipping nested sitemap"),
            }
        }

        debug!(sitemap = %sitemap_url, urls = urls.len(), "sitemap expanded");
        Ok(urls)
    }
}

fn resolve_locations(locations: Vec<String>) -> Vec<Url> {
    locations
        .into_iter()
        .filter_map(|loc| match Url::parse(&loc) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(loc = %loc, error = %err, "ignoring sitemap entry that is not an absolute URL");
                None
            }
        })
        .collect()
}
