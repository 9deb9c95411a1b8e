//! Live adapter for the `TrendingFeed` port using the Trakt API.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;

use crate::config::TraktConfig;
use crate::media::{ExternalIdentity, MediaKind, TrendingItem};
use crate::ports::feed::{FeedFuture, TrendingFeed};

const TRAKT_API_URL: &str = "https://api.trakt.tv";
const TRAKT_API_VERSION: &str = "2";
const PAGE_COUNT_HEADER: &str = "x-pagination-page-count";

/// Trending feed backed by `/movies/trending` and `/shows/trending`.
pub struct TraktFeed {
    client: Client,
    base_url: String,
    api_key: String,
    page_limit: u32,
    max_pages: u32,
}

impl TraktFeed {
    /// Creates a feed client from the Trakt config section.
    #[must_use]
    pub fn new(config: &TraktConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: TRAKT_API_URL.to_string(),
            api_key: config.api_key.clone(),
            page_limit: config.page_limit.max(1),
            max_pages: config.max_pages.max(1),
        }
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        let path = match kind {
            MediaKind::Movie => "movies",
            MediaKind::Series => "shows",
        };
        format!("{}/{path}/trending", self.base_url)
    }
}

/// One row of a trending response. Exactly one of `movie`/`show` is set.
#[derive(Deserialize)]
struct TrendingEntry {
    movie: Option<TraktTitle>,
    show: Option<TraktTitle>,
}

#[derive(Deserialize)]
struct TraktTitle {
    title: Option<String>,
    ids: TraktIds,
}

#[derive(Deserialize)]
struct TraktIds {
    imdb: Option<String>,
}

/// Parses one trending page into items, skipping titles without an IMDb id.
fn parse_page(kind: MediaKind, body: &str) -> Result<Vec<TrendingItem>, serde_json::Error> {
    let entries: Vec<TrendingEntry> = serde_json::from_str(body)?;
    let items = entries
        .into_iter()
        .filter_map(|entry| match kind {
            MediaKind::Movie => entry.movie,
            MediaKind::Series => entry.show,
        })
        .filter_map(|title| {
            let name = title.title.unwrap_or_default();
            match title.ids.imdb.filter(|id| !id.is_empty()) {
                Some(imdb) => Some(TrendingItem { identity: ExternalIdentity::new(imdb), title: name }),
                None => {
                    tracing::warn!(%kind, title = %name, "trending title has no IMDb id, skipping");
                    None
                }
            }
        })
        .collect();
    Ok(items)
}

type FeedError = Box<dyn std::error::Error + Send + Sync>;

/// One fetched trending page.
struct Page {
    items: Vec<TrendingItem>,
    /// Total pages the server advertises, when it says.
    page_count: Option<u32>,
}

/// Fetches pages from 1 up to the smaller of `max_pages` and the advertised
/// page count, flattening them in feed order.
///
/// Any page failing fails the whole fetch; a partial list is never returned.
async fn collect_pages<F, Fut>(
    kind: MediaKind,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<TrendingItem>, FeedError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page, FeedError>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    let mut last_page = max_pages;

    while page <= last_page {
        tracing::info!(%kind, page, "fetching trending page");
        let fetched = fetch_page(page).await?;
        if let Some(count) = fetched.page_count {
            last_page = last_page.min(count);
        }
        items.extend(fetched.items);
        page += 1;
    }
    Ok(items)
}

impl TraktFeed {
    async fn fetch_page(&self, url: &str, kind: MediaKind, page: u32) -> Result<Page, FeedError> {
        let response = self
            .client
            .get(url)
            .query(&[("page", page), ("limit", self.page_limit)])
            .header("Content-Type", "application/json")
            .header("trakt-api-version", TRAKT_API_VERSION)
            .header("trakt-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| -> FeedError { format!("Trakt request failed: {e}").into() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Trakt API error ({}) on page {page}", status.as_u16()).into());
        }

        let page_count = response
            .headers()
            .get(PAGE_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());

        let body = response
            .text()
            .await
            .map_err(|e| -> FeedError { format!("Failed to read Trakt response: {e}").into() })?;
        let items = parse_page(kind, &body)
            .map_err(|e| -> FeedError { format!("Failed to parse Trakt response: {e}").into() })?;
        Ok(Page { items, page_count })
    }
}

impl TrendingFeed for TraktFeed {
    fn fetch(&self, kind: MediaKind) -> FeedFuture<'_> {
        Box::pin(async move {
            let url = self.endpoint(kind);
            let url = url.as_str();
            collect_pages(kind, self.max_pages, move |page| self.fetch_page(url, kind, page)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_movie_page_in_feed_order() {
        let body = r#"[
            {"watchers": 40, "movie": {"title": "Dune", "year": 2021, "ids": {"trakt": 1, "imdb": "tt1160419"}}},
            {"watchers": 12, "movie": {"title": "Heat", "year": 1995, "ids": {"trakt": 2, "imdb": "tt0113277"}}}
        ]"#;
        let items = parse_page(MediaKind::Movie, body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].identity.as_str(), "tt1160419");
        assert_eq!(items[1].title, "Heat");
    }

    #[test]
    fn skips_titles_without_imdb_id() {
        let body = r#"[
            {"show": {"title": "Obscure", "ids": {"trakt": 9, "imdb": null}}},
            {"show": {"title": "Severance", "ids": {"trakt": 3, "imdb": "tt11280740"}}}
        ]"#;
        let items = parse_page(MediaKind::Series, body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].identity.as_str(), "tt11280740");
    }

    #[test]
    fn rejects_non_list_body() {
        assert!(parse_page(MediaKind::Movie, r#"{"error": "unauthorized"}"#).is_err());
    }

    #[test]
    fn endpoint_matches_kind() {
        let feed = TraktFeed::new(&TraktConfig { api_key: "k".into(), page_limit: 50, max_pages: 1 });
        assert_eq!(feed.endpoint(MediaKind::Movie), "https://api.trakt.tv/movies/trending");
        assert_eq!(feed.endpoint(MediaKind::Series), "https://api.trakt.tv/shows/trending");
    }

    fn page(ids: &[&str], page_count: Option<u32>) -> Result<Page, FeedError> {
        let items = ids
            .iter()
            .map(|id| TrendingItem { identity: ExternalIdentity::new(*id), title: (*id).to_string() })
            .collect();
        Ok(Page { items, page_count })
    }

    #[tokio::test]
    async fn stops_at_advertised_page_count() {
        let mut requested = Vec::new();
        let items = collect_pages(MediaKind::Movie, 5, |n| {
            requested.push(n);
            let id = format!("tt{n}");
            std::future::ready(page(&[id.as_str()], Some(2)))
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2]);
        let ids: Vec<&str> = items.iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, vec!["tt1", "tt2"]);
    }

    #[tokio::test]
    async fn stops_at_max_pages() {
        let mut requested = Vec::new();
        let items = collect_pages(MediaKind::Series, 2, |n| {
            requested.push(n);
            std::future::ready(page(&["tt1", "tt2"], Some(10)))
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2]);
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn later_page_failure_fails_whole_fetch() {
        let result = collect_pages(MediaKind::Movie, 3, |n| {
            std::future::ready(if n == 2 {
                Err("Trakt API error (502) on page 2".into())
            } else {
                page(&["tt1"], Some(3))
            })
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("page 2"));
    }
}
