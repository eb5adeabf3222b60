//! Blocking MediaWiki Action API client.
//!
//! All requests go through `action=query` with `format=json` and
//! `formatversion=2` (pages as an array, `missing`/`invalid` as booleans).

use crate::error::{Error, Result};
use crate::site::Site;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout for API round trips.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request, as the API etiquette asks for.
const USER_AGENT: &str = concat!(
    "wikifs/",
    env!("CARGO_PKG_VERSION"),
    " (read-only FUSE mount)"
);

/// Blocking client for a MediaWiki `api.php` endpoint.
///
/// Implements [`Site`] by translating each capability into an
/// `action=query` request and decoding the single page record of the
/// response.
pub struct ApiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl ApiClient {
    /// Create a client for the given `api.php` endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform an `action=query` request with extra parameters.
    fn query(&self, params: &[(&str, &str)]) -> Result<QueryResponse> {
        trace!("query {} {:?}", self.endpoint, params);

        let response: QueryResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .query(params)
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(err) = response.error {
            debug!("api error {}: {}", err.code, err.info);
            return Err(Error::Api {
                code: err.code,
                info: err.info,
            });
        }

        Ok(response)
    }
}

impl Site for ApiClient {
    fn exists(&self, title: &str) -> Result<bool> {
        let response = self.query(&[("titles", title)])?;
        let page = single_page(response, title)?;
        Ok(!(page.missing || page.invalid))
    }

    fn fetch_text(&self, title: &str) -> Result<String> {
        let response = self.query(&[
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("rvlimit", "1"),
        ])?;
        let page = single_page(response, title)?;
        revision_text(page, title)
    }

    fn latest_revision_time(&self, title: &str) -> Result<DateTime<Utc>> {
        let response = self.query(&[
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "timestamp"),
            ("rvlimit", "1"),
        ])?;
        let page = single_page(response, title)?;
        revision_timestamp(page, title)
    }

    fn earliest_revision_time(&self, title: &str) -> Result<DateTime<Utc>> {
        let response = self.query(&[
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "timestamp"),
            ("rvlimit", "1"),
            ("rvdir", "newer"),
        ])?;
        let page = single_page(response, title)?;
        revision_timestamp(page, title)
    }
}

/// Top-level `action=query` response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    error: Option<ApiError>,
    query: Option<QueryBody>,
}

/// The `error` object of a failed API call.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

/// The `query` object of a successful API call.
#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

/// One page record (formatversion=2).
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
}

/// One revision record.
#[derive(Debug, Deserialize)]
struct Revision {
    timestamp: Option<DateTime<Utc>>,
    slots: Option<RevisionSlots>,
}

/// The `slots` object of a revision fetched with `rvslots=main`.
#[derive(Debug, Deserialize)]
struct RevisionSlots {
    main: Option<SlotContent>,
}

#[derive(Debug, Deserialize)]
struct SlotContent {
    content: Option<String>,
}

/// Extract the single page record a one-title query must contain.
fn single_page(response: QueryResponse, title: &str) -> Result<Page> {
    response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| Error::MalformedResponse(format!("no page record for '{}'", title)))
}

/// Extract the main-slot content of the latest revision.
fn revision_text(page: Page, title: &str) -> Result<String> {
    if page.missing || page.invalid {
        return Err(Error::PageMissing(title.to_string()));
    }

    page.revisions
        .into_iter()
        .next()
        .and_then(|rev| rev.slots)
        .and_then(|slots| slots.main)
        .and_then(|slot| slot.content)
        .ok_or_else(|| {
            Error::MalformedResponse(format!("no main-slot content for '{}'", title))
        })
}

/// Extract the timestamp of the single returned revision.
fn revision_timestamp(page: Page, title: &str) -> Result<DateTime<Utc>> {
    if page.missing || page.invalid {
        return Err(Error::PageMissing(title.to_string()));
    }

    page.revisions
        .into_iter()
        .next()
        .and_then(|rev| rev.timestamp)
        .ok_or_else(|| {
            Error::MalformedResponse(format!("no revision timestamp for '{}'", title))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> QueryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn existing_page_is_not_missing() {
        let response = decode(
            r#"{"batchcomplete": true,
                "query": {"pages": [{"pageid": 42, "ns": 0, "title": "Foo"}]}}"#,
        );
        let page = single_page(response, "Foo").unwrap();
        assert!(!page.missing);
        assert!(!page.invalid);
    }

    #[test]
    fn missing_page_is_flagged() {
        let response = decode(
            r#"{"batchcomplete": true,
                "query": {"pages": [{"ns": 0, "title": "Nope", "missing": true}]}}"#,
        );
        let page = single_page(response, "Nope").unwrap();
        assert!(page.missing);
    }

    #[test]
    fn invalid_title_is_flagged() {
        let response = decode(
            r#"{"query": {"pages": [{"title": "<bad>", "invalid": true,
                "invalidreason": "contains invalid characters"}]}}"#,
        );
        let page = single_page(response, "<bad>").unwrap();
        assert!(page.invalid);
    }

    #[test]
    fn content_is_extracted_from_main_slot() {
        let response = decode(
            r#"{"query": {"pages": [{"pageid": 42, "title": "Foo",
                "revisions": [{"slots": {"main": {
                    "contentmodel": "wikitext",
                    "content": "bar"}}}]}]}}"#,
        );
        let page = single_page(response, "Foo").unwrap();
        assert_eq!(revision_text(page, "Foo").unwrap(), "bar");
    }

    #[test]
    fn content_of_missing_page_is_page_missing() {
        let response = decode(
            r#"{"query": {"pages": [{"title": "Nope", "missing": true}]}}"#,
        );
        let page = single_page(response, "Nope").unwrap();
        assert!(matches!(
            revision_text(page, "Nope"),
            Err(Error::PageMissing(_))
        ));
    }

    #[test]
    fn timestamp_is_extracted() {
        let response = decode(
            r#"{"query": {"pages": [{"pageid": 42, "title": "Foo",
                "revisions": [{"timestamp": "2024-05-01T12:30:00Z"}]}]}}"#,
        );
        let page = single_page(response, "Foo").unwrap();
        let ts = revision_timestamp(page, "Foo").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn revision_without_timestamp_is_malformed() {
        let response = decode(
            r#"{"query": {"pages": [{"title": "Foo", "revisions": [{}]}]}}"#,
        );
        let page = single_page(response, "Foo").unwrap();
        assert!(matches!(
            revision_timestamp(page, "Foo"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_page_list_is_malformed() {
        let response = decode(r#"{"query": {"pages": []}}"#);
        assert!(matches!(
            single_page(response, "Foo"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn api_error_object_decodes() {
        let response = decode(
            r#"{"error": {"code": "maxlag", "info": "Waiting for a database server"}}"#,
        );
        let err = response.error.unwrap();
        assert_eq!(err.code, "maxlag");
        assert_eq!(err.info, "Waiting for a database server");
    }
}
