// Copyright 2026 The GhostFS Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Public API: the surface other crates (the CLI, and any future
//! FUSE-style front end) drive the filesystem through.

use ghostfs_ds::DataStorage;
use ghostfs_err::{FsError, Result};

use crate::dir::DirPos;
use crate::dirent::{Entry, EntryRef};
use crate::FileSystem;

/// Metadata returned by `getattr`, shaped for a `stat(2)`-style caller.
#[derive(Debug, Clone, Copy)]
pub struct Attr {
    pub is_dir: bool,
    pub size: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: u64,
    pub mode: u32,
}

/// Filesystem-wide capacity summary, shaped for a `statvfs(2)`-style caller.
#[derive(Debug, Clone, Copy)]
pub struct StatVfs {
    pub bsize: u32,
    pub blocks: u64,
    pub bfree: u64,
}

/// An open file: the resolved entry, kept by value rather than by live
/// reference so it can outlive any single directory scan.
pub struct FileHandle {
    entry: Entry,
}

/// An open directory iterator.
pub struct DirHandle {
    cluster: u64,
    pos: Option<DirPos>,
    done: bool,
}

const DIR_MODE: u32 = 0o040755;
const FILE_MODE: u32 = 0o100644;

impl<DS: DataStorage> FileSystem<DS> {
    pub fn create(&self, path: &str) -> Result<()> {
        self.create_entry(path, false)
    }

    pub fn mkdir(&self, path: &str) -> Result<()> {
        self.create_entry(path, true)
    }

    pub fn unlink(&self, path: &str) -> Result<()> {
        self.remove_entry(path, false)
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        self.remove_entry(path, true)
    }

    pub fn open(&self, path: &str) -> Result<FileHandle> {
        let entry = self.lookup(path, false)?;
        if entry.is_dir {
            return Err(FsError::IsADirectory.into());
        }
        Ok(FileHandle { entry })
    }

    pub fn read_handle(&self, handle: &FileHandle, buf: &mut [u8], offset: u32) -> Result<u32> {
        self.read(&handle.entry, buf, offset)
    }

    pub fn write_handle(&self, handle: &mut FileHandle, buf: &[u8], offset: u32) -> Result<u32> {
        self.write(&mut handle.entry, buf, offset)
    }

    pub fn truncate_handle(&self, handle: &mut FileHandle, new_size: u32) -> Result<()> {
        self.truncate(&mut handle.entry, new_size)
    }

    pub fn truncate_path(&self, path: &str, new_size: u32) -> Result<()> {
        let mut entry = self.lookup(path, false)?;
        self.truncate(&mut entry, new_size)
    }

    pub fn release(&self, _handle: FileHandle) -> Result<()> {
        Ok(())
    }

    pub fn opendir(&self, path: &str) -> Result<DirHandle> {
        let entry = self.lookup(path, false)?;
        if !entry.is_dir {
            return Err(FsError::NotADirectory.into());
        }
        let cluster = match entry.entry_ref {
            EntryRef::Root => 0,
            EntryRef::InCluster { .. } => entry.cluster as u64,
        };
        Ok(DirHandle {
            cluster,
            pos: None,
            done: false,
        })
    }

    pub fn next_entry(&self, handle: &mut DirHandle) -> Result<Option<String>> {
        if handle.done {
            return Ok(None);
        }
        let next = match handle.pos {
            None => self.first_used(handle.cluster),
            Some(pos) => self.dir_next_used(&pos),
        };
        match next {
            Ok(pos) => {
                handle.pos = Some(pos);
                let raw = self.dir_read(&pos)?;
                Ok(Some(raw.name().to_string()))
            }
            Err(ghostfs_err::Error::Fs(FsError::NotFound)) => {
                handle.done = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn closedir(&self, _handle: DirHandle) -> Result<()> {
        Ok(())
    }

    pub fn getattr(&self, path: &str) -> Result<Attr> {
        let entry = self.lookup(path, false)?;
        Ok(Attr {
            is_dir: entry.is_dir,
            size: entry.size,
            uid: self.uid,
            gid: self.gid,
            mtime: self.mtime,
            mode: if entry.is_dir { DIR_MODE } else { FILE_MODE },
        })
    }

    pub fn statvfs(&self) -> StatVfs {
        StatVfs {
            bsize: crate::cluster::CLUSTER_SIZE as u32,
            blocks: self.store.cluster_count(),
            bfree: self.store.free_clusters(),
        }
    }

    /// Recursively renders the directory tree rooted at `path`, one line per
    /// entry: `<indent><name>[/] (size bytes, cluster N)`.
    pub fn debug(&self, path: &str) -> Result<String> {
        let entry = self.lookup(path, false)?;
        if !entry.is_dir {
            return Err(FsError::NotADirectory.into());
        }
        let mut out = String::new();
        self.debug_dir(&entry, 0, &mut out)?;
        Ok(out)
    }

    fn debug_dir(&self, dir: &Entry, depth: usize, out: &mut String) -> Result<()> {
        use std::fmt::Write as _;

        let cluster = match dir.entry_ref {
            EntryRef::Root => 0,
            EntryRef::InCluster { .. } => dir.cluster as u64,
        };

        let mut pos = match self.first_used(cluster) {
            Ok(pos) => Some(pos),
            Err(ghostfs_err::Error::Fs(FsError::NotFound)) => None,
            Err(e) => return Err(e),
        };

        while let Some(p) = pos {
            let raw = self.dir_read(&p)?;
            let indent = "  ".repeat(depth);
            let suffix = if raw.is_dir() { "/" } else { "" };
            let _ = writeln!(
                out,
                "{indent}{}{suffix} ({} bytes, cluster {})",
                raw.name(),
                raw.size(),
                raw.cluster()
            );
            if raw.is_dir() {
                let child = Entry {
                    entry_ref: EntryRef::InCluster {
                        cluster: p.cluster,
                        slot: p.index,
                    },
                    is_dir: true,
                    size: raw.size(),
                    cluster: raw.cluster(),
                };
                self.debug_dir(&child, depth + 1, out)?;
            }
            pos = match self.dir_next_used(&p) {
                Ok(next) => Some(next),
                Err(ghostfs_err::Error::Fs(FsError::NotFound)) => None,
                Err(e) => return Err(e),
            };
        }
        Ok(())
    }
}
