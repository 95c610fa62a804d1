//! Page parsing and continuation for Clio list endpoints.
//!
//! List responses look like `{"data": [...], "meta": {"paging": {"next": "<url>"}}}`.
//! A present `next` means more pages. When the `next` URL carries a
//! `page_token` the following request sends that cursor; otherwise the page
//! number is incremented.

use reqwest::Url;
use serde_json::Value;

/// Largest `per_page` the API accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// One page of results plus its continuation marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

impl Page {
    pub fn from_body(body: Value) -> Self {
        let next = body
            .pointer("/meta/paging/next")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let items = match body {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => Vec::new(),
                Some(single) => vec![single],
                // endpoints that return the entity itself
                None => vec![Value::Object(map)],
            },
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        Self { items, next }
    }
}

/// Query state for the next page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    params: Vec<(String, String)>,
    per_page: u32,
    page: u32,
    page_token: Option<String>,
}

impl PageCursor {
    /// First page, with `per_page` capped at `MAX_PAGE_SIZE`.
    pub fn first(params: &[(String, String)], per_page: u32) -> Self {
        let params = params
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "page" | "per_page" | "page_token"))
            .cloned()
            .collect();
        Self {
            params,
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
            page: 1,
            page_token: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn page_token(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    /// Cursor for the page after this one, given the server's `next` marker.
    pub fn advance(&self, next: &str) -> Self {
        let page_token = Url::parse(next).ok().and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "page_token")
                .map(|(_, v)| v.into_owned())
        });
        Self {
            params: self.params.clone(),
            per_page: self.per_page,
            page: self.page + 1,
            page_token,
        }
    }

    /// Query string pairs for this page.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = self.params.clone();
        query.push(("per_page".into(), self.per_page.to_string()));
        match &self.page_token {
            Some(token) => query.push(("page_token".into(), token.clone())),
            None => query.push(("page".into(), self.page.to_string())),
        }
        query
    }
}
