use crate::Result;
use chrono::{DateTime, Utc};

/// The content-service capability set consumed by the filesystem core.
///
/// A `Site` answers four questions about a page, keyed by its title:
/// does it exist, what is its current text, and when was it last and
/// first revised. All queries are remote round trips; implementations
/// must not cache on behalf of the caller.
pub trait Site {
    /// Whether a page with this title exists.
    fn exists(&self, title: &str) -> Result<bool>;

    /// The current text of the page.
    fn fetch_text(&self, title: &str) -> Result<String>;

    /// Timestamp of the latest revision.
    fn latest_revision_time(&self, title: &str) -> Result<DateTime<Utc>>;

    /// Timestamp of the earliest revision.
    fn earliest_revision_time(&self, title: &str) -> Result<DateTime<Utc>>;
}
