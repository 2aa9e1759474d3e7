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

//! Directory entry layout and the logical types the directory/file engines
//! operate on.

use ghostfs_ds::DataStorage;
use ghostfs_err::{FsError, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::cluster::ClusterStore;

/// On-disk size of one directory entry.
pub const ENTRY_SIZE: usize = 62;
/// Maximum filename length, NUL terminator not included.
pub const MAX_NAME_LEN: usize = 55;
/// Physical entry slots per directory cluster (`PAYLOAD_SIZE / ENTRY_SIZE`).
pub const ENTRIES_PER_CLUSTER: u64 = (crate::cluster::PAYLOAD_SIZE / ENTRY_SIZE) as u64;
/// Entry slots the directory iterator actually visits before following the
/// cluster chain. The cluster reserves 66 slots but only 65 are ever
/// reachable; preserved as a compatibility behavior rather than silently
/// widened.
pub const ENTRIES_ITERATED: u64 = ENTRIES_PER_CLUSTER - 1;

const DIR_FLAG: u32 = 1 << 31;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct DirEntryRaw {
    pub filename: [u8; 56],
    pub size_and_flag: U32,
    pub first_cluster: U16,
}

impl DirEntryRaw {
    pub fn empty() -> Self {
        Self {
            filename: [0u8; 56],
            size_and_flag: U32::new(0),
            first_cluster: U16::new(0),
        }
    }

    pub fn is_empty_slot(&self) -> bool {
        self.filename[0] == 0
    }

    pub fn name(&self) -> &str {
        let len = self
            .filename
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.filename.len());
        std::str::from_utf8(&self.filename[..len]).unwrap_or("")
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::NameTooLong.into());
        }
        self.filename = [0u8; 56];
        self.filename[..name.len()].copy_from_slice(name.as_bytes());
        Ok(())
    }

    pub fn size(&self) -> u32 {
        self.size_and_flag.get() & !DIR_FLAG
    }

    pub fn is_dir(&self) -> bool {
        self.size_and_flag.get() & DIR_FLAG != 0
    }

    pub fn set_size_and_flag(&mut self, size: u32, is_dir: bool) {
        let flag = if is_dir { DIR_FLAG } else { 0 };
        self.size_and_flag = U32::new(size | flag);
    }

    pub fn cluster(&self) -> u16 {
        self.first_cluster.get()
    }

    pub fn set_cluster(&mut self, cluster: u16) {
        self.first_cluster = U16::new(cluster);
    }
}

/// Identifies where a directory entry lives: the synthetic root (no on-disk
/// entry) or a concrete cluster/slot pair. A tagged variant instead of
/// pointer comparisons against a sentinel cluster index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRef {
    Root,
    InCluster { cluster: u64, slot: u64 },
}

/// A snapshot of a resolved directory entry (or the synthetic root).
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub entry_ref: EntryRef,
    pub is_dir: bool,
    pub size: u32,
    pub cluster: u16,
}

impl Entry {
    pub fn root() -> Self {
        Self {
            entry_ref: EntryRef::Root,
            is_dir: true,
            size: 0,
            cluster: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.entry_ref, EntryRef::Root)
    }
}

impl<DS: DataStorage> ClusterStore<DS> {
    pub fn read_entry(&self, cluster: u64, slot: u64) -> Result<DirEntryRaw> {
        let mut buf = [0u8; ENTRY_SIZE];
        self.read_payload(cluster, (slot * ENTRY_SIZE as u64) as usize, &mut buf)?;
        DirEntryRaw::read_from_bytes(&buf).map_err(|_| FsError::Corrupt.into())
    }

    pub fn write_entry(&self, cluster: u64, slot: u64, entry: &DirEntryRaw) -> Result<()> {
        self.write_payload(cluster, (slot * ENTRY_SIZE as u64) as usize, entry.as_bytes())
    }
}
