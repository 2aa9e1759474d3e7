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

//! File engine: chain growth/shrinkage, reads, writes, and rename.

use ghostfs_ds::DataStorage;
use ghostfs_err::{Error, FsError, Result};

use crate::cluster::PAYLOAD_SIZE;
use crate::dir::{DirPos, EmptySlot};
use crate::dirent::{DirEntryRaw, Entry, EntryRef, MAX_NAME_LEN};
use crate::FileSystem;

impl<DS: DataStorage> FileSystem<DS> {
    fn clusters_needed(size: u32) -> u64 {
        if size == 0 {
            0
        } else {
            (size as u64 + PAYLOAD_SIZE as u64 - 1) / PAYLOAD_SIZE as u64
        }
    }

    fn write_back_entry(&self, entry: &Entry) -> Result<()> {
        match entry.entry_ref {
            EntryRef::Root => Ok(()),
            EntryRef::InCluster { cluster, slot } => {
                let mut raw = self.store.read_entry(cluster, slot)?;
                raw.set_size_and_flag(entry.size, entry.is_dir);
                raw.set_cluster(entry.cluster);
                self.store.write_entry(cluster, slot, &raw)
            }
        }
    }

    /// Grows or shrinks `entry`'s cluster chain to hold exactly `new_size`
    /// bytes, zeroing newly-exposed bytes, and persists the updated
    /// size/cluster back to the directory entry.
    pub fn truncate(&self, entry: &mut Entry, new_size: u32) -> Result<()> {
        if entry.is_dir {
            return Err(FsError::IsADirectory.into());
        }
        if new_size > i32::MAX as u32 {
            return Err(FsError::TooLarge.into());
        }

        let old_count = Self::clusters_needed(entry.size);
        let new_count = Self::clusters_needed(new_size);

        // Zero the unused tail of the current final cluster before any
        // reallocation, so growth that only extends the existing chain
        // (or grows into freshly-appended clusters) never exposes stale
        // bytes from a previous, larger write.
        if new_size > entry.size && old_count > 0 {
            let last = self.store.at(entry.cluster as u64, old_count - 1)?;
            let base = (old_count - 1) * PAYLOAD_SIZE as u64;
            let old_off = (entry.size as u64 - base) as usize;
            let end = if new_count > old_count {
                PAYLOAD_SIZE
            } else {
                (new_size as u64 - base) as usize
            };
            if end > old_off {
                let zeros = vec![0u8; end - old_off];
                self.store.write_payload(last, old_off, &zeros)?;
            }
        }

        if new_count == 0 {
            if old_count > 0 {
                self.store.free_chain(entry.cluster as u64)?;
            }
            entry.cluster = 0;
        } else if old_count == 0 {
            let first = self.store.alloc_chain(new_count, true)?;
            entry.cluster = first as u16;
        } else if new_count > old_count {
            let grow_by = new_count - old_count;
            let last = self.store.at(entry.cluster as u64, old_count - 1)?;
            let new_first = self.store.alloc_chain(grow_by, true)?;
            self.store.set_next(last, new_first as u16)?;
        } else if new_count < old_count {
            let last_keep = self.store.at(entry.cluster as u64, new_count - 1)?;
            let first_free = self.store.next_or_corrupt(last_keep)?;
            self.store.set_next(last_keep, 0)?;
            self.store.free_chain(first_free)?;
        }

        entry.size = new_size;
        self.write_back_entry(entry)
    }

    /// Writes `buf` at `offset`, auto-truncating the file to fit if the
    /// write extends past the current end.
    pub fn write(&self, entry: &mut Entry, buf: &[u8], offset: u32) -> Result<u32> {
        if entry.is_dir {
            return Err(FsError::IsADirectory.into());
        }
        let end = offset as u64 + buf.len() as u64;
        if end > i32::MAX as u64 {
            return Err(FsError::Overflow.into());
        }
        if end > entry.size as u64 {
            self.truncate(entry, end as u32)?;
        }

        let mut written = 0usize;
        while written < buf.len() {
            let pos = offset as u64 + written as u64;
            let cluster_index = pos / PAYLOAD_SIZE as u64;
            let in_cluster = (pos % PAYLOAD_SIZE as u64) as usize;
            let nr = self.store.at(entry.cluster as u64, cluster_index)?;
            let chunk = std::cmp::min(buf.len() - written, PAYLOAD_SIZE - in_cluster);
            self.store
                .write_payload(nr, in_cluster, &buf[written..written + chunk])?;
            written += chunk;
        }
        Ok(written as u32)
    }

    /// Reads into `buf` from `offset`, clamped to the file's size.
    pub fn read(&self, entry: &Entry, buf: &mut [u8], offset: u32) -> Result<u32> {
        if entry.is_dir {
            return Err(FsError::IsADirectory.into());
        }
        if offset as u64 >= entry.size as u64 {
            return Ok(0);
        }
        let avail = entry.size as u64 - offset as u64;
        let to_read = std::cmp::min(buf.len() as u64, avail) as usize;

        let mut done = 0usize;
        while done < to_read {
            let pos = offset as u64 + done as u64;
            let cluster_index = pos / PAYLOAD_SIZE as u64;
            let in_cluster = (pos % PAYLOAD_SIZE as u64) as usize;
            let nr = self.store.at(entry.cluster as u64, cluster_index)?;
            let chunk = std::cmp::min(to_read - done, PAYLOAD_SIZE - in_cluster);
            self.store
                .read_payload(nr, in_cluster, &mut buf[done..done + chunk])?;
            done += chunk;
        }
        Ok(done as u32)
    }

    /// Moves a file to a new path. Directories are explicitly rejected
    /// rather than silently relinked.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let old_entry = self.lookup(old_path, false)?;
        if old_entry.is_root() {
            return Err(FsError::Invalid.into());
        }
        if old_entry.is_dir {
            return Err(FsError::IsADirectory.into());
        }

        let new_parent = self.lookup(new_path, true)?;
        if !new_parent.is_dir {
            return Err(FsError::NotADirectory.into());
        }
        let new_name = new_path.rsplit('/').next().unwrap_or("");
        if new_name.is_empty() {
            return Err(FsError::Invalid.into());
        }
        if new_name.len() > MAX_NAME_LEN {
            return Err(FsError::NameTooLong.into());
        }

        let new_parent_cluster = match new_parent.entry_ref {
            EntryRef::Root => 0,
            EntryRef::InCluster { .. } => new_parent.cluster as u64,
        };

        match self.find_named_entry(new_parent_cluster, new_name) {
            Ok((_, raw)) if raw.is_dir() => return Err(FsError::Exists.into()),
            Ok(_) => self.remove_entry(new_path, false)?,
            Err(Error::Fs(FsError::NotFound)) => {}
            Err(e) => return Err(e),
        }

        let slot = match self.find_empty_entry(new_parent_cluster)? {
            EmptySlot::Found(pos) => pos,
            EmptySlot::ChainEnd(last_pos) => {
                let new_cluster = self.store.alloc_chain(1, true)?;
                self.store.set_next(last_pos.cluster, new_cluster as u16)?;
                DirPos {
                    cluster: new_cluster,
                    index: 0,
                }
            }
        };

        let mut raw = DirEntryRaw::empty();
        raw.set_name(new_name)?;
        raw.set_size_and_flag(old_entry.size, false);
        raw.set_cluster(old_entry.cluster);
        self.store.write_entry(slot.cluster, slot.index, &raw)?;

        let (old_cluster, old_slot) = match old_entry.entry_ref {
            EntryRef::InCluster { cluster, slot } => (cluster, slot),
            EntryRef::Root => unreachable!("root rejected above"),
        };
        let mut old_raw = self.store.read_entry(old_cluster, old_slot)?;
        old_raw.filename[0] = 0;
        self.store.write_entry(old_cluster, old_slot, &old_raw)?;

        Ok(())
    }
}
