//! wiki-mount: Mount a MediaWiki site as a read-only FUSE filesystem.
//!
//! Each wiki page appears as a regular file named by its title; reading the
//! file fetches the page's current wikitext. The directory is not listable:
//! pages appear only when opened by exact title.
//!
//! # Usage
//!
//! ```bash
//! # Mount English Wikipedia
//! wiki-mount /mnt/wiki
//!
//! # Then read a page by title
//! cat "/mnt/wiki/Rust (programming language)"
//! ```

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use wiki_api::ApiClient;
use wikifs::{fuse, AttrSynthesizer, WikiFuseFs};

/// Mount a MediaWiki site as a read-only filesystem.
///
/// Pages are fetched on demand from the site's Action API; nothing is
/// stored locally.
#[derive(Parser, Debug)]
#[command(name = "wiki-mount")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to mount the wiki at
    #[arg(value_name = "MOUNTPOINT")]
    mountpoint: PathBuf,

    /// MediaWiki api.php endpoint URL
    #[arg(long, default_value = "https://en.wikipedia.org/w/api.php")]
    api: String,

    /// Owner uid reported for every file (default: current user)
    #[arg(long)]
    uid: Option<u32>,

    /// Owner gid reported for every file (default: current group)
    #[arg(long)]
    gid: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    // Validate mountpoint
    if !args.mountpoint.exists() {
        error!("Mountpoint not found: {}", args.mountpoint.display());
        process::exit(1);
    }

    if !args.mountpoint.is_dir() {
        error!("Not a directory: {}", args.mountpoint.display());
        process::exit(1);
    }

    // Build the API client
    let site = match ApiClient::new(&args.api) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to build API client: {}", e);
            process::exit(1);
        }
    };

    let uid = args.uid.unwrap_or_else(|| unsafe { libc::getuid() });
    let gid = args.gid.unwrap_or_else(|| unsafe { libc::getgid() });

    let fs = WikiFuseFs::new(site, AttrSynthesizer::new(uid, gid));

    info!("Mounting {} at {}", args.api, args.mountpoint.display());
    info!("Pages appear on lookup by exact title; the directory is not listable");

    if let Err(e) = fuse::mount(fs, &args.mountpoint) {
        error!("Mount failed: {}", e);
        process::exit(1);
    }
}
