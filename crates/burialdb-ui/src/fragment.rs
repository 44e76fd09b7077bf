#![forbid(unsafe_code)]

//! Fragment endpoint contract.
//!
//! The server renders one page of list rows as a markup fragment and returns
//! it wrapped in JSON: `{ "content": "<tr>…</tr>", "has_next": true }`.
//! This module builds the request URLs, decodes the payload, and defines
//! [`FragmentSource`], the asynchronous seam the loader awaits. The browser
//! implementation lives in `burialdb-ui-wasm`; tests use scripted sources.

use core::fmt;
use core::future::Future;

use serde::{Deserialize, Serialize};

/// Query parameter carrying the requested page number.
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Why a fragment could not be obtained.
///
/// All variants collapse into the single "fragment fetch failed" outcome at
/// the loader boundary; the cause is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentFetchError {
    /// The request never produced a response (network error, CORS, abort).
    Transport(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The body was not a fragment payload.
    Decode(String),
}

impl FragmentFetchError {
    /// Stable machine-readable code for transition logs.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Transport(_) => "transport".to_owned(),
            Self::Status(status) => format!("status_{status}"),
            Self::Decode(_) => "decode".to_owned(),
        }
    }
}

impl fmt::Display for FragmentFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "fragment transport error: {msg}"),
            Self::Status(status) => write!(f, "fragment endpoint returned status {status}"),
            Self::Decode(msg) => write!(f, "fragment payload decode error: {msg}"),
        }
    }
}

impl std::error::Error for FragmentFetchError {}

/// Address of the paginated fragment endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentEndpoint {
    base: String,
    page_param: String,
}

impl FragmentEndpoint {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_page_param(base, DEFAULT_PAGE_PARAM)
    }

    #[must_use]
    pub fn with_page_param(base: impl Into<String>, page_param: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            page_param: page_param.into(),
        }
    }

    /// URL requesting `page`.
    ///
    /// Any `page` parameter already present on the base address is replaced
    /// and a trailing `#fragment` is dropped; other query pairs are kept in
    /// order.
    #[must_use]
    pub fn url_for(&self, page: u32) -> String {
        let without_hash = match self.base.split_once('#') {
            Some((head, _)) => head,
            None => self.base.as_str(),
        };
        let (path, query) = match without_hash.split_once('?') {
            Some((path, query)) => (path, query),
            None => (without_hash, ""),
        };

        let page_pair = format!("{}={page}", self.page_param);
        let mut pairs: Vec<&str> = query
            .split('&')
            .filter(|pair| !pair.is_empty() && query_key(pair) != self.page_param)
            .collect();
        pairs.push(&page_pair);

        format!("{path}?{}", pairs.join("&"))
    }

    /// Build the request for `page`.
    #[must_use]
    pub fn request(&self, page: u32) -> FragmentRequest {
        FragmentRequest {
            page,
            url: self.url_for(page),
        }
    }
}

fn query_key(pair: &str) -> &str {
    match pair.split_once('=') {
        Some((key, _)) => key,
        None => pair,
    }
}

/// One outstanding request for a page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentRequest {
    pub page: u32,
    pub url: String,
}

/// Decoded fragment endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FragmentPayload {
    /// Pre-rendered rows, inserted verbatim after the last row of the list.
    pub content: String,
    /// Optional end-of-list hint from the server.
    #[serde(default)]
    pub has_next: Option<bool>,
}

impl FragmentPayload {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            has_next: None,
        }
    }

    /// Decode a response body.
    pub fn from_json(body: &str) -> Result<Self, FragmentFetchError> {
        serde_json::from_str(body).map_err(|e| FragmentFetchError::Decode(e.to_string()))
    }

    /// Whether the fragment carries no markup worth inserting.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Asynchronous provider of fragment payloads.
///
/// Implementations perform exactly one request per call and never retry.
pub trait FragmentSource {
    fn fetch(
        &self,
        request: &FragmentRequest,
    ) -> impl Future<Output = Result<FragmentPayload, FragmentFetchError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_page_to_bare_path() {
        let endpoint = FragmentEndpoint::new("/persons/more/");
        assert_eq!(endpoint.url_for(2), "/persons/more/?page=2");
    }

    #[test]
    fn url_keeps_existing_query_pairs() {
        let endpoint = FragmentEndpoint::new("/persons/more/?q=ivanov&sort=fio");
        assert_eq!(endpoint.url_for(3), "/persons/more/?q=ivanov&sort=fio&page=3");
    }

    #[test]
    fn url_replaces_existing_page_param_and_drops_hash() {
        let endpoint = FragmentEndpoint::new("/hospitals/7/?page=1&q=x#rows");
        assert_eq!(endpoint.url_for(2), "/hospitals/7/?q=x&page=2");
    }

    #[test]
    fn url_does_not_confuse_prefixed_params() {
        let endpoint = FragmentEndpoint::new("/list/?pages=4&page_size=10");
        assert_eq!(endpoint.url_for(5), "/list/?pages=4&page_size=10&page=5");
    }

    #[test]
    fn url_honours_custom_page_param() {
        let endpoint = FragmentEndpoint::with_page_param("/list/", "p");
        assert_eq!(endpoint.request(4).url, "/list/?p=4");
        assert_eq!(endpoint.request(4).page, 4);
    }

    #[test]
    fn payload_decodes_content_and_optional_hint() {
        let payload = FragmentPayload::from_json(r#"{"content":"<tr><td>a</td></tr>"}"#)
            .expect("payload should decode");
        assert_eq!(payload.content, "<tr><td>a</td></tr>");
        assert_eq!(payload.has_next, None);

        let last = FragmentPayload::from_json(r#"{"content":"","has_next":false}"#)
            .expect("payload should decode");
        assert!(last.is_blank());
        assert_eq!(last.has_next, Some(false));
    }

    #[test]
    fn payload_without_content_is_a_decode_error() {
        let err = FragmentPayload::from_json(r#"{"html":"<tr/>"}"#).unwrap_err();
        assert!(matches!(err, FragmentFetchError::Decode(_)));
        assert_eq!(err.code(), "decode");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(FragmentFetchError::Status(500).code(), "status_500");
        assert_eq!(
            FragmentFetchError::Transport("offline".to_owned()).code(),
            "transport"
        );
        assert_eq!(
            FragmentFetchError::Status(404).to_string(),
            "fragment endpoint returned status 404"
        );
    }
}
