//! FUSE dispatcher for WikiFS.
//!
//! This module implements the `fuser::Filesystem` trait for `WikiFuseFs`,
//! translating kernel requests into content-service queries. The core
//! operations are plain methods on the struct so the logic is testable
//! without a kernel mount; the trait impl is thin reply glue.

use crate::attr::{AttrSynthesizer, ResolutionCounters, BLOCK_SIZE, TTL};
use crate::registry::{Registry, ROOT_INODE};
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, Request, TimeOrNow,
};
use libc::{c_int, EIO, ENOENT, ENOSYS};
use log::{debug, error, trace, warn};
use std::ffi::OsStr;
use std::path::Path;
use std::time::SystemTime;
use wiki_api::Site;

/// Synthetic statfs figures. Not derived from the remote service; they just
/// signal "plenty of space" without claiming accuracy.
const STATFS_TOTAL_BYTES: u64 = 9000;
const STATFS_TOTAL_INODES: u64 = 9000;
const STATFS_FREE_BLOCKS_FLOOR: u64 = 1024;
const STATFS_FREE_INODES_FLOOR: u64 = 100;
const MAX_NAME_LEN: u32 = 255;

/// FUSE filesystem dispatcher backed by a content-service [`Site`].
///
/// Owns the registry, the attribute synthesizer, and the resolution
/// counters; there is no state beyond these. The inode doubles as the file
/// handle: the filesystem is read-only and stateless per open.
pub struct WikiFuseFs<S: Site> {
    site: S,
    registry: Registry,
    synth: AttrSynthesizer,
    counters: ResolutionCounters,
}

impl<S: Site> WikiFuseFs<S> {
    /// Create a dispatcher over the given site.
    pub fn new(site: S, synth: AttrSynthesizer) -> Self {
        Self {
            site,
            registry: Registry::new(),
            synth,
            counters: ResolutionCounters::default(),
        }
    }

    /// The title-to-inode registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The resolution counters.
    pub fn counters(&self) -> &ResolutionCounters {
        &self.counters
    }

    /// Look up a title and synthesize its attributes.
    ///
    /// A registry entry is created only when the page exists; a nonexistent
    /// title is ENOENT and leaves no trace besides the counter. A failed
    /// existence query is a real I/O failure and maps to EIO rather than
    /// ENOENT, so a transient network error does not poison the kernel's
    /// negative dentry cache for the TTL.
    pub fn lookup_title(&mut self, name: &str) -> Result<FileAttr, c_int> {
        match self.site.exists(name) {
            Ok(true) => {
                let inode = self.registry.resolve(name);
                Ok(self
                    .synth
                    .attributes_for(inode, &self.registry, &self.site, &mut self.counters))
            }
            Ok(false) => {
                debug!("lookup: '{}' does not exist", name);
                self.counters.note_nonexistent();
                Err(ENOENT)
            }
            Err(err) => {
                warn!("lookup: existence query for '{}' failed: {}", name, err);
                Err(EIO)
            }
        }
    }

    /// Synthesize attributes for an inode. Never fails.
    pub fn attr(&mut self, inode: u64) -> FileAttr {
        self.synth
            .attributes_for(inode, &self.registry, &self.site, &mut self.counters)
    }

    /// Read a byte range of the page text behind a handle.
    ///
    /// Re-fetches the text on every call; the range is clipped to the
    /// content length, and an offset at or past the end yields an empty
    /// slice.
    pub fn read_range(&mut self, fh: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let title = match self.registry.title_of(fh) {
            Some(t) => t.to_owned(),
            None => {
                warn!("read: handle {} has no known title", fh);
                return Err(ENOENT);
            }
        };

        let text = match self.site.fetch_text(&title) {
            Ok(t) => t,
            Err(err) => {
                error!("read: fetching '{}' failed: {}", title, err);
                return Err(EIO);
            }
        };

        let bytes = text.as_bytes();
        if offset < 0 || offset as usize >= bytes.len() {
            trace!("read: offset {} beyond content length {}", offset, bytes.len());
            return Ok(Vec::new());
        }

        let start = offset as usize;
        let end = std::cmp::min(start + size as usize, bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    /// Directory entries for a listing. Always empty: the corpus is
    /// unbounded and never enumerated, so the namespace is not browsable.
    pub fn directory_entries(&self, _inode: u64) -> Vec<(u64, FileType, String)> {
        Vec::new()
    }
}

impl<S: Site> Filesystem for WikiFuseFs<S> {
    /// Look up a directory entry by name, treating the name as a title.
    ///
    /// The parent inode is accepted but not validated; the namespace is
    /// flat, so there is conceptually only the root parent.
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        trace!("lookup(parent={}, name={:?})", parent, name);

        let name = match name.to_str() {
            Some(n) => n,
            None => {
                warn!("lookup: name {:?} is not valid UTF-8", name);
                reply.error(ENOENT);
                return;
            }
        };

        match self.lookup_title(name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(errno) => reply.error(errno),
        }
    }

    /// Get file attributes. Always succeeds.
    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!("getattr(ino={})", ino);
        let attr = self.attr(ino);
        reply.attr(&TTL, &attr);
    }

    fn readlink(&mut self, _req: &Request, ino: u64, reply: ReplyData) {
        debug!("readlink(ino={}): not supported", ino);
        reply.error(ENOSYS);
    }

    /// Open a directory. Always hands back the root handle, regardless of
    /// the requested inode.
    fn opendir(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!("opendir(ino={})", ino);
        reply.opened(ROOT_INODE, 0);
    }

    /// Read directory entries. Always empty, for every inode.
    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!("readdir(ino={}, offset={})", ino, offset);

        for (i, (ino, kind, name)) in self
            .directory_entries(ino)
            .into_iter()
            .enumerate()
            .skip(offset as usize)
        {
            if reply.add(ino, (i + 1) as i64, kind, name) {
                break;
            }
        }

        reply.ok();
    }

    fn unlink(&mut self, _req: &Request, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(ENOSYS);
    }

    fn rmdir(&mut self, _req: &Request, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
        reply.error(ENOSYS);
    }

    fn symlink(
        &mut self,
        _req: &Request,
        _parent: u64,
        _link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        reply.error(ENOSYS);
    }

    fn rename(
        &mut self,
        _req: &Request,
        _parent: u64,
        _name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        reply.error(ENOSYS);
    }

    fn link(
        &mut self,
        _req: &Request,
        _ino: u64,
        _newparent: u64,
        _newname: &OsStr,
        reply: ReplyEntry,
    ) {
        reply.error(ENOSYS);
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request,
        _ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        reply.error(ENOSYS);
    }

    fn mknod(
        &mut self,
        _req: &Request,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        reply.error(ENOSYS);
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        reply.error(ENOSYS);
    }

    /// Get filesystem statistics: fixed synthetic figures.
    fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
        trace!("statfs");

        let blocks = STATFS_TOTAL_BYTES / u64::from(BLOCK_SIZE);
        let bfree = std::cmp::max(blocks, STATFS_FREE_BLOCKS_FLOOR);
        let ffree = std::cmp::max(STATFS_TOTAL_INODES, STATFS_FREE_INODES_FLOOR);

        reply.statfs(
            blocks,
            bfree,
            bfree,
            STATFS_TOTAL_INODES,
            ffree,
            BLOCK_SIZE,
            MAX_NAME_LEN,
            BLOCK_SIZE,
        );
    }

    /// Open a file. Always succeeds; the inode doubles as the handle, and
    /// flags are not inspected (writes are rejected at the write operation).
    fn open(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!("open(ino={})", ino);
        reply.opened(ino, 0);
    }

    /// Grant access unconditionally; read-only enforcement happens at the
    /// mutating operations.
    fn access(&mut self, _req: &Request, ino: u64, _mask: i32, reply: ReplyEmpty) {
        trace!("access(ino={})", ino);
        reply.ok();
    }

    fn create(
        &mut self,
        _req: &Request,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        reply.error(ENOSYS);
    }

    /// Read file data, re-fetching the page text on every call.
    fn read(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!("read(fh={}, offset={}, size={})", fh, offset, size);

        match self.read_range(fh, offset, size) {
            Ok(data) => reply.data(&data),
            Err(errno) => reply.error(errno),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write(
        &mut self,
        _req: &Request,
        _ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        reply.error(ENOSYS);
    }

    /// Release a file. Nothing to free.
    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        debug!("release(fh={})", fh);
        reply.ok();
    }
}
