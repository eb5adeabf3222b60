//! FUSE mount lifecycle for WikiFS.
//!
//! This module wires the [`WikiFuseFs`] dispatcher into the kernel via
//! `fuser`, either in the foreground (blocking until unmount) or in the
//! background (unmounting when the session handle drops).
//!
//! # Example
//!
//! ```ignore
//! use wiki_api::ApiClient;
//! use wikifs::{fuse, AttrSynthesizer, WikiFuseFs};
//!
//! let site = ApiClient::new("https://en.wikipedia.org/w/api.php")?;
//! let fs = WikiFuseFs::new(site, AttrSynthesizer::new(1000, 1000));
//! fuse::mount(fs, "/mnt/wiki".as_ref())?;
//! ```

mod adapter;

pub use adapter::WikiFuseFs;

use fuser::MountOption;
use log::debug;
use std::io;
use std::path::Path;
use wiki_api::Site;

fn mount_options() -> Vec<MountOption> {
    vec![
        MountOption::RO,
        MountOption::FSName("wikifs".to_string()),
        // Mounting over a non-empty directory is fine; libfuse3 implies this.
        MountOption::CUSTOM("nonempty".to_string()),
    ]
}

/// Mount the filesystem in the foreground.
///
/// Blocks until the filesystem is unmounted.
///
/// # Errors
///
/// Returns an error if the mount point is invalid or FUSE mounting fails.
pub fn mount<S: Site>(fs: WikiFuseFs<S>, mountpoint: &Path) -> io::Result<()> {
    debug!("mounting wikifs at {}", mountpoint.display());
    fuser::mount2(fs, mountpoint, &mount_options())
}

/// Mount the filesystem in the background and return a session handle.
///
/// The filesystem stays mounted until the returned `BackgroundSession` is
/// dropped or its `join()` is called.
pub fn mount_background<S: Site + Send + 'static>(
    fs: WikiFuseFs<S>,
    mountpoint: &Path,
) -> io::Result<fuser::BackgroundSession> {
    debug!("mounting wikifs at {} (background)", mountpoint.display());
    fuser::spawn_mount2(fs, mountpoint, &mount_options())
}
