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

//! Cluster store: fixed-size cluster read/write over a `DataStorage`, with
//! an in-memory lazy cache. Dirty tracking lives in a side `RefCell<bool>`
//! per cached cluster rather than the on-disk reserved byte, which is
//! fragile to share between reader and writer.

use std::cell::RefCell;

use ghostfs_ds::DataStorage;
use ghostfs_err::{FsError, Result};
use zerocopy::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Total on-disk size of one cluster: 4092 bytes payload + 4 byte trailer.
pub const CLUSTER_SIZE: usize = 4096;
/// Usable payload bytes per cluster (file data or directory entries).
pub const PAYLOAD_SIZE: usize = 4092;
/// Superblock prefix: 16-byte MD5 + 2-byte cluster_count, before cluster 0.
pub const SUPERBLOCK_SIZE: u64 = 18;

#[repr(C)]
#[derive(Debug, Clone, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ClusterRaw {
    pub payload: [u8; PAYLOAD_SIZE],
    pub next: U16,
    pub used: u8,
    reserved: u8,
}

impl ClusterRaw {
    pub fn zeroed() -> Self {
        Self {
            payload: [0u8; PAYLOAD_SIZE],
            next: U16::new(0),
            used: 0,
            reserved: 0,
        }
    }
}

struct CachedCluster {
    raw: RefCell<ClusterRaw>,
    dirty: RefCell<bool>,
}

/// Lazy, unbounded cluster cache over a `DataStorage`. Clusters are loaded
/// on first access and stay cached until `sync`/`unmount` write them back;
/// there is no eviction. `cluster_count` is capped at 0xFFFF, so the cache
/// is bounded regardless.
pub struct ClusterStore<DS: DataStorage> {
    storage: DS,
    cluster_count: u64,
    cache: RefCell<Vec<Option<CachedCluster>>>,
    free_clusters: std::cell::Cell<u64>,
}

impl<DS: DataStorage> ClusterStore<DS> {
    pub fn new(storage: DS, cluster_count: u64, free_clusters: u64) -> Self {
        let mut cache = Vec::with_capacity(cluster_count as usize);
        cache.resize_with(cluster_count as usize, || None);
        Self {
            storage,
            cluster_count,
            cache: RefCell::new(cache),
            free_clusters: std::cell::Cell::new(free_clusters),
        }
    }

    pub fn cluster_count(&self) -> u64 {
        self.cluster_count
    }

    pub fn free_clusters(&self) -> u64 {
        self.free_clusters.get()
    }

    pub(crate) fn dec_free(&self) {
        self.free_clusters.set(self.free_clusters.get() - 1);
    }

    pub(crate) fn inc_free(&self) {
        self.free_clusters.set(self.free_clusters.get() + 1);
    }

    pub(crate) fn set_free_clusters(&self, free: u64) {
        self.free_clusters.set(free);
    }

    pub fn storage(&self) -> &DS {
        &self.storage
    }

    fn cluster_offset(nr: u64) -> u64 {
        SUPERBLOCK_SIZE + nr * CLUSTER_SIZE as u64
    }

    /// Ensure cluster `nr` is present in the cache, reading it from storage
    /// on first access.
    fn load(&self, nr: u64) -> Result<()> {
        if nr >= self.cluster_count {
            return Err(FsError::OutOfRange.into());
        }
        if self.cache.borrow()[nr as usize].is_none() {
            let mut raw = ClusterRaw::zeroed();
            self.storage
                .read_at(Self::cluster_offset(nr), raw.as_mut_bytes())?;
            raw.reserved = 0;
            self.cache.borrow_mut()[nr as usize] = Some(CachedCluster {
                raw: RefCell::new(raw),
                dirty: RefCell::new(false),
            });
        }
        Ok(())
    }

    /// `get(nr)`: read-only access to the cluster's current state.
    pub fn with_cluster<R>(&self, nr: u64, f: impl FnOnce(&ClusterRaw) -> R) -> Result<R> {
        self.load(nr)?;
        let cache = self.cache.borrow();
        let cached = cache[nr as usize].as_ref().expect("just loaded");
        Ok(f(&cached.raw.borrow()))
    }

    /// Mutable access to the cluster; marks it dirty.
    pub fn with_cluster_mut<R>(&self, nr: u64, f: impl FnOnce(&mut ClusterRaw) -> R) -> Result<R> {
        self.load(nr)?;
        let cache = self.cache.borrow();
        let cached = cache[nr as usize].as_ref().expect("just loaded");
        let result = f(&mut cached.raw.borrow_mut());
        *cached.dirty.borrow_mut() = true;
        Ok(result)
    }

    pub fn next(&self, nr: u64) -> Result<u16> {
        self.with_cluster(nr, |c| c.next.get())
    }

    pub fn set_next(&self, nr: u64, next: u16) -> Result<()> {
        self.with_cluster_mut(nr, |c| c.next = U16::new(next))
    }

    pub fn used(&self, nr: u64) -> Result<bool> {
        self.with_cluster(nr, |c| c.used != 0)
    }

    pub fn set_used(&self, nr: u64, used: bool) -> Result<()> {
        self.with_cluster_mut(nr, |c| c.used = used as u8)
    }

    pub fn read_payload(&self, nr: u64, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.with_cluster(nr, |c| buf.copy_from_slice(&c.payload[offset..offset + buf.len()]))
    }

    pub fn write_payload(&self, nr: u64, offset: usize, buf: &[u8]) -> Result<()> {
        self.with_cluster_mut(nr, |c| {
            c.payload[offset..offset + buf.len()].copy_from_slice(buf)
        })
    }

    pub fn zero_payload(&self, nr: u64) -> Result<()> {
        self.with_cluster_mut(nr, |c| c.payload = [0u8; PAYLOAD_SIZE])
    }

    /// `get_next(c)`: the cluster chained after `nr`; fails if `nr` is the
    /// chain terminator.
    pub fn next_or_corrupt(&self, nr: u64) -> Result<u64> {
        let next = self.next(nr)?;
        if next == 0 {
            return Err(FsError::Corrupt.into());
        }
        Ok(next as u64)
    }

    /// `at(start_nr, index)`: the cluster `index` steps after `start_nr`
    /// along its chain (`index == 0` returns `start_nr` itself).
    pub fn at(&self, start_nr: u64, index: u64) -> Result<u64> {
        let mut cur = start_nr;
        for _ in 0..index {
            cur = self.next_or_corrupt(cur)?;
        }
        Ok(cur)
    }

    /// Writes cluster `nr` back to storage unconditionally and clears its
    /// dirty flag. The in-memory dirty byte is never written (it is always
    /// zero on disk).
    pub fn flush(&self, nr: u64) -> Result<()> {
        self.load(nr)?;
        let cache = self.cache.borrow();
        let cached = cache[nr as usize].as_ref().expect("just loaded");
        *cached.dirty.borrow_mut() = false;
        self.storage
            .write_at(Self::cluster_offset(nr), cached.raw.borrow().as_bytes())
    }

    /// Writes back every dirty cached cluster with index `>= start`.
    pub fn flush_dirty(&self, start: u64) -> Result<()> {
        let dirty_nrs: Vec<u64> = {
            let cache = self.cache.borrow();
            (start..self.cluster_count)
                .filter(|&nr| {
                    cache[nr as usize]
                        .as_ref()
                        .map(|c| *c.dirty.borrow())
                        .unwrap_or(false)
                })
                .collect()
        };
        for nr in dirty_nrs {
            self.flush(nr)?;
        }
        Ok(())
    }
}
