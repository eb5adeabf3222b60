//! # wikifs
//!
//! Read-only FUSE filesystem that exposes a MediaWiki site as a flat
//! directory of title-named files.
//!
//! This crate provides:
//! - [`Registry`]: the bidirectional title-to-inode map
//! - [`AttrSynthesizer`]: POSIX attribute records synthesized from remote
//!   page metadata
//! - [`WikiFuseFs`]: the `fuser::Filesystem` dispatcher, plus mount helpers
//!   in the [`fuse`] module
//!
//! The namespace is flat and deliberately not browsable: `readdir` is always
//! empty, and pages appear only when looked up by exact title. Reading a
//! file fetches the page's current wikitext on every call.
//!
//! ## Example
//!
//! ```ignore
//! use wiki_api::ApiClient;
//! use wikifs::{fuse, AttrSynthesizer, WikiFuseFs};
//!
//! let site = ApiClient::new("https://en.wikipedia.org/w/api.php")?;
//! let fs = WikiFuseFs::new(site, AttrSynthesizer::new(1000, 1000));
//! fuse::mount(fs, "/mnt/wiki".as_ref())?;
//! ```

pub mod attr;
pub mod fuse;
pub mod registry;

pub use attr::{AttrSynthesizer, ResolutionCounters};
pub use fuse::WikiFuseFs;
pub use registry::{Registry, ROOT_INODE};
