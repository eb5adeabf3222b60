//! Bidirectional title-to-inode map.
//!
//! Inodes are derived from the CRC-32 of the title's UTF-8 bytes, widened
//! to `u64`. The checksum is not collision-free, so `resolve` probes upward
//! to the next free inode when the derived number is already taken; a probed
//! inode stays stable for the life of the process (the mapping is never
//! persisted across restarts).

use log::debug;
use std::collections::HashMap;

/// Inode of the single root directory, reserved by the FUSE protocol.
pub const ROOT_INODE: u64 = fuser::FUSE_ROOT_ID;

/// The title-to-inode registry.
///
/// Append-only and lazily populated: an entry is created the first time a
/// title is resolved, and lives until process exit. No eviction, no TTL.
#[derive(Debug, Default)]
pub struct Registry {
    title_to_inode: HashMap<String, u64>,
    inode_to_title: HashMap<u64, String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a title to an inode, recording the pair on first use.
    ///
    /// Idempotent: repeated calls with the same title return the same inode.
    pub fn resolve(&mut self, title: &str) -> u64 {
        if let Some(&inode) = self.title_to_inode.get(title) {
            return inode;
        }

        let inode = self.probe_from(Self::derive(title));
        debug!("registry: '{}' -> inode {}", title, inode);

        self.title_to_inode.insert(title.to_string(), inode);
        self.inode_to_title.insert(inode, title.to_string());
        inode
    }

    /// Reverse lookup. `None` is the normal outcome for the root inode and
    /// for inode numbers that were never resolved.
    pub fn title_of(&self, inode: u64) -> Option<&str> {
        self.inode_to_title.get(&inode).map(String::as_str)
    }

    /// Forward lookup without recording anything.
    pub fn inode_of(&self, title: &str) -> Option<u64> {
        self.title_to_inode.get(title).copied()
    }

    /// Number of recorded (title, inode) pairs.
    pub fn len(&self) -> usize {
        self.title_to_inode.len()
    }

    /// Whether no title has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.title_to_inode.is_empty()
    }

    /// Derive the candidate inode for a title.
    fn derive(title: &str) -> u64 {
        u64::from(crc32fast::hash(title.as_bytes()))
    }

    /// First free inode at or above `candidate`, skipping reserved numbers
    /// (0 and the root) and inodes held by other titles.
    fn probe_from(&self, candidate: u64) -> u64 {
        let mut inode = candidate;
        while inode == 0 || inode == ROOT_INODE || self.inode_to_title.contains_key(&inode) {
            inode = inode.wrapping_add(1);
        }
        inode
    }
}
