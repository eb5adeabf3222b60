//! # wiki-api
//!
//! MediaWiki content-service client for WikiFS.
//!
//! This crate provides:
//! - The [`Site`] trait: the capability set the filesystem core consumes
//!   (existence, page text, revision timestamps)
//! - [`ApiClient`]: a blocking implementation of [`Site`] over the
//!   MediaWiki Action API (`api.php`)
//!
//! ## Example
//!
//! ```ignore
//! use wiki_api::{ApiClient, Site};
//!
//! let site = ApiClient::new("https://en.wikipedia.org/w/api.php")?;
//! if site.exists("Rust (programming language)")? {
//!     let text = site.fetch_text("Rust (programming language)")?;
//!     println!("{} bytes of wikitext", text.len());
//! }
//! ```

mod api;
mod error;
mod site;

pub use api::ApiClient;
pub use error::{Error, Result};
pub use site::Site;
