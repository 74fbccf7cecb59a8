// Limit/offset pagination that only kicks in when the client asks for it

use axum::http::{header::HOST, HeaderMap, Uri};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::PaginationConfig;
use crate::infrastructure::database::PageWindow;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";

/// Either the whole listing or one page of it
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page(Page<T>),
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy)]
pub struct LimitOffsetPagination {
    default_limit: u32,
    max_limit: u32,
}

impl Default for LimitOffsetPagination {
    fn default() -> Self {
        Self::new(&PaginationConfig::default())
    }
}

impl LimitOffsetPagination {
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// `None` when neither `limit` nor `offset` was sent, meaning the full
    /// listing should be returned unpaginated.
    pub fn window(&self, params: &HashMap<String, String>) -> Option<PageWindow> {
        if !params.contains_key(LIMIT_PARAM) && !params.contains_key(OFFSET_PARAM) {
            return None;
        }

        let limit = params
            .get(LIMIT_PARAM)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(u64::from(self.max_limit)) as u32)
            .unwrap_or(self.default_limit);

        let offset = params
            .get(OFFSET_PARAM)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Some(PageWindow { limit, offset })
    }

    /// Wrap one window of results with the total count and neighbour links
    pub fn page<T>(
        &self,
        results: Vec<T>,
        count: u64,
        window: PageWindow,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Page<T> {
        let base = base_url(uri, headers);
        let limit = u64::from(window.limit);

        let next_offset = window.offset.saturating_add(limit);
        let next = (next_offset < count).then(|| page_link(&base, window.limit, Some(next_offset)));

        let previous = if window.offset == 0 {
            None
        } else if window.offset <= limit {
            Some(page_link(&base, window.limit, None))
        } else {
            Some(page_link(&base, window.limit, Some(window.offset - limit)))
        };

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

fn base_url(uri: &Uri, headers: &HeaderMap) -> String {
    match headers.get(HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, uri.path()),
        None => uri.path().to_string(),
    }
}

fn page_link(base: &str, limit: u32, offset: Option<u64>) -> String {
    match offset {
        Some(offset) => format!("{}?{}={}&{}={}", base, LIMIT_PARAM, limit, OFFSET_PARAM, offset),
        None => format!("{}?{}={}", base, LIMIT_PARAM, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_params_means_unpaginated() {
        let pagination = LimitOffsetPagination::default();
        assert_eq!(pagination.window(&params(&[])), None);
        assert_eq!(pagination.window(&params(&[("search", "x")])), None);
    }

    #[test]
    fn test_limit_only() {
        let pagination = LimitOffsetPagination::default();
        assert_eq!(
            pagination.window(&params(&[("limit", "2")])),
            Some(PageWindow { limit: 2, offset: 0 })
        );
    }

    #[test]
    fn test_offset_only_uses_default_limit() {
        let pagination = LimitOffsetPagination::default();
        assert_eq!(
            pagination.window(&params(&[("offset", "5")])),
            Some(PageWindow { limit: 10, offset: 5 })
        );
    }

    #[test]
    fn test_limit_is_capped_and_sanitised() {
        let pagination = LimitOffsetPagination::default();
        assert_eq!(pagination.window(&params(&[("limit", "1000")])).unwrap().limit, 100);
        assert_eq!(pagination.window(&params(&[("limit", "99999999999")])).unwrap().limit, 100);
        assert_eq!(pagination.window(&params(&[("limit", "0")])).unwrap().limit, 10);
        assert_eq!(pagination.window(&params(&[("limit", "-3")])).unwrap().limit, 10);
        assert_eq!(pagination.window(&params(&[("limit", "abc")])).unwrap().limit, 10);
        assert_eq!(pagination.window(&params(&[("limit", "")])).unwrap().limit, 10);
        assert_eq!(pagination.window(&params(&[("offset", "-1")])).unwrap().offset, 0);
    }

    #[test]
    fn test_custom_limits() {
        let pagination = LimitOffsetPagination::new(&PaginationConfig {
            default_limit: 3,
            max_limit: 5,
        });
        assert_eq!(pagination.window(&params(&[("offset", "0")])).unwrap().limit, 3);
        assert_eq!(pagination.window(&params(&[("limit", "9")])).unwrap().limit, 5);
    }

    #[test]
    fn test_page_links() {
        let pagination = LimitOffsetPagination::default();
        let uri: Uri = "/api/v1/posts?limit=2&offset=2".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("blog.test"));

        let page = pagination.page(vec![3, 4], 5, PageWindow { limit: 2, offset: 2 }, &uri, &headers);
        assert_eq!(page.count, 5);
        assert_eq!(
            page.next.as_deref(),
            Some("http://blog.test/api/v1/posts?limit=2&offset=4")
        );
        assert_eq!(page.previous.as_deref(), Some("http://blog.test/api/v1/posts?limit=2"));

        let last = pagination.page(vec![5], 5, PageWindow { limit: 2, offset: 4 }, &uri, &headers);
        assert_eq!(last.next, None);
        assert_eq!(
            last.previous.as_deref(),
            Some("http://blog.test/api/v1/posts?limit=2&offset=2")
        );

        let first = pagination.page(vec![1, 2], 5, PageWindow { limit: 2, offset: 0 }, &uri, &HeaderMap::new());
        assert_eq!(first.previous, None);
        assert_eq!(first.next.as_deref(), Some("/api/v1/posts?limit=2&offset=2"));
    }

    #[test]
    fn test_listing_serialization() {
        let all: Listing<i32> = Listing::All(vec![1, 2]);
        assert_eq!(serde_json::to_value(&all).unwrap(), serde_json::json!([1, 2]));

        let page: Listing<i32> = Listing::Page(Page {
            count: 2,
            next: None,
            previous: None,
            results: vec![1],
        });
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["results"], serde_json::json!([1]));
    }
}
