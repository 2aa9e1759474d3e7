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

//! Directory engine: path resolution, entry creation and removal. Directory
//! position is tracked as `(cluster, entry_index)` rather than a
//! cached-cluster reference, so there's no dangling-pointer risk if the
//! cache ever grew eviction.

use ghostfs_ds::DataStorage;
use ghostfs_err::{Error, FsError, Result};

use crate::dirent::{DirEntryRaw, Entry, EntryRef, ENTRIES_ITERATED, MAX_NAME_LEN};
use crate::FileSystem;

#[derive(Debug, Clone, Copy)]
pub(crate) struct DirPos {
    pub cluster: u64,
    pub index: u64,
}

impl DirPos {
    fn start(cluster: u64) -> Self {
        Self { cluster, index: 0 }
    }
}

pub(crate) enum EmptySlot {
    Found(DirPos),
    ChainEnd(DirPos),
}

impl<DS: DataStorage> FileSystem<DS> {
    pub(crate) fn dir_read(&self, pos: &DirPos) -> Result<DirEntryRaw> {
        self.store.read_entry(pos.cluster, pos.index)
    }

    /// Advances `pos` within its cluster, following the chain at the
    /// iteration boundary (slot `ENTRIES_ITERATED`, not the physical
    /// `ENTRIES_PER_CLUSTER`).
    fn dir_advance(&self, pos: &mut DirPos) -> Result<()> {
        pos.index += 1;
        if pos.index >= ENTRIES_ITERATED {
            let next = self.store.next(pos.cluster)?;
            if next == 0 {
                return Err(FsError::NotFound.into());
            }
            pos.cluster = next as u64;
            pos.index = 0;
        }
        Ok(())
    }

    /// Advances from `pos` until a used entry is found. Does not mutate
    /// `pos` itself; a failure leaves the caller's position untouched.
    pub(crate) fn dir_next_used(&self, pos: &DirPos) -> Result<DirPos> {
        let mut cur = *pos;
        loop {
            self.dir_advance(&mut cur)?;
            if !self.dir_read(&cur)?.is_empty_slot() {
                return Ok(cur);
            }
        }
    }

    /// The first used entry at or after the start of `start_cluster`'s
    /// chain; `NotFound` if the directory is empty.
    pub(crate) fn first_used(&self, start_cluster: u64) -> Result<DirPos> {
        let pos = DirPos::start(start_cluster);
        if !self.dir_read(&pos)?.is_empty_slot() {
            return Ok(pos);
        }
        self.dir_next_used(&pos)
    }

    pub(crate) fn find_empty_entry(&self, start_cluster: u64) -> Result<EmptySlot> {
        let mut pos = DirPos::start(start_cluster);
        loop {
            if self.dir_read(&pos)?.is_empty_slot() {
                return Ok(EmptySlot::Found(pos));
            }
            if pos.index + 1 >= ENTRIES_ITERATED {
                let next = self.store.next(pos.cluster)?;
                if next == 0 {
                    return Ok(EmptySlot::ChainEnd(pos));
                }
                pos = DirPos {
                    cluster: next as u64,
                    index: 0,
                };
            } else {
                pos.index += 1;
            }
        }
    }

    pub(crate) fn find_named_entry(&self, start_cluster: u64, name: &str) -> Result<(DirPos, DirEntryRaw)> {
        let mut pos = DirPos::start(start_cluster);
        loop {
            let raw = self.dir_read(&pos)?;
            if !raw.is_empty_slot() && raw.name() == name {
                return Ok((pos, raw));
            }
            pos = self.dir_next_used(&pos)?;
        }
    }

    /// Resolves `path` to an entry. `skip_last = true` resolves the
    /// *parent* of the final path component instead of the component
    /// itself.
    pub fn lookup(&self, path: &str, skip_last: bool) -> Result<Entry> {
        if !path.starts_with('/') {
            return Err(FsError::Invalid.into());
        }
        if path == "/" {
            return Ok(Entry::root());
        }

        let tail = &path[1..];
        if skip_last && !tail.contains('/') {
            return Ok(Entry::root());
        }

        let mut components: Vec<&str> = tail.split('/').collect();
        if skip_last {
            components.pop();
        }
        if components.is_empty() {
            return Ok(Entry::root());
        }

        let mut cur_cluster = 0u64;
        let last = components.len() - 1;
        for (i, &comp) in components.iter().enumerate() {
            if comp.is_empty() {
                return Err(FsError::Invalid.into());
            }
            let (pos, raw) = self.find_named_entry(cur_cluster, comp)?;
            if i == last {
                return Ok(Entry {
                    entry_ref: EntryRef::InCluster {
                        cluster: pos.cluster,
                        slot: pos.index,
                    },
                    is_dir: raw.is_dir(),
                    size: raw.size(),
                    cluster: raw.cluster(),
                });
            }
            if !raw.is_dir() {
                return Err(FsError::NotADirectory.into());
            }
            cur_cluster = raw.cluster() as u64;
        }
        unreachable!("components is non-empty, loop always returns on the last component")
    }

    /// Creates a file or (empty) directory entry.
    pub fn create_entry(&self, path: &str, is_dir: bool) -> Result<()> {
        let parent = self.lookup(path, true)?;
        if !parent.is_dir {
            return Err(FsError::NotADirectory.into());
        }

        let name = path.rsplit('/').next().unwrap_or("");
        if name.is_empty() {
            return Err(FsError::Invalid.into());
        }
        if name.len() > MAX_NAME_LEN {
            return Err(FsError::NameTooLong.into());
        }

        let parent_cluster = match parent.entry_ref {
            EntryRef::Root => 0,
            EntryRef::InCluster { .. } => parent.cluster as u64,
        };

        match self.find_named_entry(parent_cluster, name) {
            Ok(_) => return Err(FsError::Exists.into()),
            Err(Error::Fs(FsError::NotFound)) => {}
            Err(e) => return Err(e),
        }

        let last_parent_cluster_for_rollback;
        let slot = match self.find_empty_entry(parent_cluster)? {
            EmptySlot::Found(pos) => {
                last_parent_cluster_for_rollback = None;
                pos
            }
            EmptySlot::ChainEnd(last_pos) => {
                let new_cluster = self.store.alloc_chain(1, true)?;
                self.store.set_next(last_pos.cluster, new_cluster as u16)?;
                last_parent_cluster_for_rollback = Some((last_pos.cluster, new_cluster));
                DirPos {
                    cluster: new_cluster,
                    index: 0,
                }
            }
        };

        let cluster = if is_dir {
            match self.store.alloc_chain(1, true) {
                Ok(c) => c as u16,
                Err(e) => {
                    if let Some((parent_last, new_cluster)) = last_parent_cluster_for_rollback {
                        self.store.set_next(parent_last, 0)?;
                        self.store.free_chain(new_cluster)?;
                    }
                    return Err(e);
                }
            }
        } else {
            0
        };

        let mut raw = DirEntryRaw::empty();
        raw.set_name(name)?;
        raw.set_size_and_flag(0, is_dir);
        raw.set_cluster(cluster);
        self.store.write_entry(slot.cluster, slot.index, &raw)?;
        Ok(())
    }

    /// Unlinks a file or removes an empty directory.
    pub fn remove_entry(&self, path: &str, is_dir_expected: bool) -> Result<()> {
        let target = self.lookup(path, false)?;
        if target.is_root() {
            return Err(FsError::Invalid.into());
        }
        if is_dir_expected && !target.is_dir {
            return Err(FsError::NotADirectory.into());
        }
        if !is_dir_expected && target.is_dir {
            return Err(FsError::IsADirectory.into());
        }

        if target.is_dir {
            let pos = DirPos::start(target.cluster as u64);
            if !self.dir_read(&pos)?.is_empty_slot() {
                return Err(FsError::NotEmpty.into());
            }
            match self.dir_next_used(&pos) {
                Ok(_) => return Err(FsError::NotEmpty.into()),
                Err(Error::Fs(FsError::NotFound)) => {}
                Err(e) => return Err(e),
            }
        }

        if target.cluster != 0 {
            self.store.free_chain(target.cluster as u64)?;
        }

        let (cluster, slot) = match target.entry_ref {
            EntryRef::InCluster { cluster, slot } => (cluster, slot),
            EntryRef::Root => unreachable!("root rejected above"),
        };
        let mut raw = self.store.read_entry(cluster, slot)?;
        raw.filename[0] = 0;
        self.store.write_entry(cluster, slot, &raw)?;
        Ok(())
    }
}
