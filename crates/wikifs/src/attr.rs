//! Attribute synthesis from remote page metadata.
//!
//! Attribute queries never fail: once an inode is known to the namespace,
//! the kernel expects `getattr` to succeed, so a missing page, a vanished
//! page, or a remote failure all degrade to a zero-size record with epoch
//! timestamps. Existence is adjudicated earlier, at lookup time.

use crate::registry::{Registry, ROOT_INODE};
use chrono::{DateTime, Utc};
use fuser::{FileAttr, FileType};
use log::debug;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use wiki_api::Site;

/// How long the kernel may cache entries and attributes.
pub const TTL: Duration = Duration::from_secs(300);

/// Fixed block size reported for every record and in statfs.
pub const BLOCK_SIZE: u32 = 512;

/// Fixed block count reported for every record.
const BLOCKS: u64 = 1;

/// Process-lifetime resolution totals.
///
/// Purely diagnostic, monotonically incremented and never reset; the only
/// reader besides logging is the root directory's informational link count.
#[derive(Debug, Default)]
pub struct ResolutionCounters {
    existent: u64,
    nonexistent: u64,
}

impl ResolutionCounters {
    /// Record a resolution that found a backing page.
    pub fn note_existent(&mut self) {
        self.existent += 1;
    }

    /// Record a resolution that found nothing.
    pub fn note_nonexistent(&mut self) {
        self.nonexistent += 1;
    }

    /// Total resolutions that found a backing page.
    pub fn existent(&self) -> u64 {
        self.existent
    }

    /// Total resolutions that found nothing.
    pub fn nonexistent(&self) -> u64 {
        self.nonexistent
    }

    /// All resolutions ever made.
    pub fn total(&self) -> u64 {
        self.existent + self.nonexistent
    }
}

/// Builds `FileAttr` records for inodes.
///
/// Records are values, recomputed on every call; the only caching layer is
/// the kernel's, driven by the [`TTL`] hint.
#[derive(Debug, Clone, Copy)]
pub struct AttrSynthesizer {
    uid: u32,
    gid: u32,
}

impl AttrSynthesizer {
    /// Create a synthesizer reporting the given owner on every record.
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Synthesize the attribute record for an inode. Never fails.
    ///
    /// The root inode gets a directory record whose link count approximates
    /// "how many things have ever been resolved"; any other inode gets a
    /// regular-file record sized from the page's current text, degrading to
    /// zero size and epoch timestamps when the inode is unknown or the
    /// remote query fails.
    pub fn attributes_for<S: Site>(
        &self,
        inode: u64,
        registry: &Registry,
        site: &S,
        counters: &mut ResolutionCounters,
    ) -> FileAttr {
        if inode == ROOT_INODE {
            return self.root_attr(counters);
        }

        let (size, mtime, ctime) = match registry.title_of(inode) {
            Some(title) => match document_facts(site, title) {
                Ok((size, latest, earliest)) => {
                    counters.note_existent();
                    (size, SystemTime::from(latest), SystemTime::from(earliest))
                }
                Err(err) => {
                    debug!("attr: remote query for '{}' failed: {}", title, err);
                    counters.note_nonexistent();
                    (0, UNIX_EPOCH, UNIX_EPOCH)
                }
            },
            None => {
                debug!("attr: inode {} has no known title", inode);
                counters.note_nonexistent();
                (0, UNIX_EPOCH, UNIX_EPOCH)
            }
        };

        FileAttr {
            ino: inode,
            size,
            blocks: BLOCKS,
            atime: UNIX_EPOCH,
            mtime,
            ctime,
            crtime: ctime,
            kind: FileType::RegularFile,
            perm: 0o755,
            nlink: 1,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    /// The synthetic record for the root directory.
    fn root_attr(&self, counters: &ResolutionCounters) -> FileAttr {
        FileAttr {
            ino: ROOT_INODE,
            size: 0,
            blocks: BLOCKS,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: FileType::Directory,
            perm: 0o755,
            nlink: counters.total().saturating_add(1).min(u64::from(u32::MAX)) as u32,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }
}

/// Fetch the facts a file record is built from: content byte length and the
/// latest/earliest revision times.
fn document_facts<S: Site>(
    site: &S,
    title: &str,
) -> wiki_api::Result<(u64, DateTime<Utc>, DateTime<Utc>)> {
    let text = site.fetch_text(title)?;
    let latest = site.latest_revision_time(title)?;
    let earliest = site.earliest_revision_time(title)?;
    Ok((text.len() as u64, latest, earliest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct StubSite {
        text: Option<String>,
        broken: Cell<bool>,
    }

    impl StubSite {
        fn with_text(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                broken: Cell::new(false),
            }
        }

        fn empty() -> Self {
            Self {
                text: None,
                broken: Cell::new(false),
            }
        }
    }

    impl Site for StubSite {
        fn exists(&self, _title: &str) -> wiki_api::Result<bool> {
            Ok(self.text.is_some())
        }

        fn fetch_text(&self, title: &str) -> wiki_api::Result<String> {
            if self.broken.get() {
                return Err(wiki_api::Error::MalformedResponse("scripted".into()));
            }
            self.text
                .clone()
                .ok_or_else(|| wiki_api::Error::PageMissing(title.to_string()))
        }

        fn latest_revision_time(&self, _title: &str) -> wiki_api::Result<DateTime<Utc>> {
            Ok(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        }

        fn earliest_revision_time(&self, _title: &str) -> wiki_api::Result<DateTime<Utc>> {
            Ok(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        }
    }

    #[test]
    fn root_is_a_directory_with_approximate_link_count() {
        let synth = AttrSynthesizer::new(1000, 1000);
        let registry = Registry::new();
        let site = StubSite::empty();
        let mut counters = ResolutionCounters::default();
        counters.note_existent();
        counters.note_nonexistent();

        let attr = synth.attributes_for(ROOT_INODE, &registry, &site, &mut counters);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.nlink, 3);
        assert_eq!(attr.size, 0);
        // Root short-circuits before any counter is touched.
        assert_eq!(counters.total(), 2);
    }

    #[test]
    fn known_title_gets_size_and_revision_times() {
        let synth = AttrSynthesizer::new(1000, 1000);
        let mut registry = Registry::new();
        let site = StubSite::with_text("bar");
        let mut counters = ResolutionCounters::default();

        let inode = registry.resolve("Foo");
        let attr = synth.attributes_for(inode, &registry, &site, &mut counters);

        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.size, 3);
        assert_ne!(attr.mtime, UNIX_EPOCH);
        assert_ne!(attr.ctime, UNIX_EPOCH);
        assert_eq!(attr.atime, UNIX_EPOCH);
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.nlink, 1);
        assert_eq!(counters.existent(), 1);
    }

    #[test]
    fn unknown_inode_degrades_to_absent_defaults() {
        let synth = AttrSynthesizer::new(1000, 1000);
        let registry = Registry::new();
        let site = StubSite::with_text("bar");
        let mut counters = ResolutionCounters::default();

        let attr = synth.attributes_for(99999, &registry, &site, &mut counters);
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.mtime, UNIX_EPOCH);
        assert_eq!(attr.ctime, UNIX_EPOCH);
        assert_eq!(counters.nonexistent(), 1);
    }

    #[test]
    fn remote_failure_degrades_instead_of_erroring() {
        let synth = AttrSynthesizer::new(1000, 1000);
        let mut registry = Registry::new();
        let site = StubSite::with_text("bar");
        let mut counters = ResolutionCounters::default();

        let inode = registry.resolve("Foo");
        site.broken.set(true);

        let attr = synth.attributes_for(inode, &registry, &site, &mut counters);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.mtime, UNIX_EPOCH);
        assert_eq!(counters.nonexistent(), 1);
        assert_eq!(counters.existent(), 0);
    }

    #[test]
    fn multi_byte_text_reports_utf8_byte_length() {
        let synth = AttrSynthesizer::new(1000, 1000);
        let mut registry = Registry::new();
        let site = StubSite::with_text("héllo");
        let mut counters = ResolutionCounters::default();

        let inode = registry.resolve("Foo");
        let attr = synth.attributes_for(inode, &registry, &site, &mut counters);
        assert_eq!(attr.size, 6);
    }

    #[test]
    fn configured_owner_is_reported() {
        let synth = AttrSynthesizer::new(501, 20);
        let registry = Registry::new();
        let site = StubSite::empty();
        let mut counters = ResolutionCounters::default();

        let attr = synth.attributes_for(ROOT_INODE, &registry, &site, &mut counters);
        assert_eq!(attr.uid, 501);
        assert_eq!(attr.gid, 20);
    }
}
