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

//! Superblock & integrity: format, mount, sync, unmount.

use std::time::{SystemTime, UNIX_EPOCH};

use ghostfs_ds::DataStorage;
use ghostfs_err::{FsError, Result};
use log::{error, info};
use md5::{Digest, Md5};
use zerocopy::little_endian::U16;
use zerocopy::IntoBytes;

use crate::cluster::{ClusterRaw, ClusterStore, CLUSTER_SIZE, PAYLOAD_SIZE, SUPERBLOCK_SIZE};
use crate::FileSystem;

fn cluster_offset(nr: u64) -> u64 {
    SUPERBLOCK_SIZE + nr * CLUSTER_SIZE as u64
}

fn header_md5(header: &[u8; 2], cluster0: &ClusterRaw) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(header);
    hasher.update(cluster0.as_bytes());
    hasher.finalize().into()
}

/// Formats `storage` as an empty GhostFS filesystem: superblock, an empty
/// root directory, and every other cluster marked free.
pub fn format<DS: DataStorage>(storage: &DS) -> Result<()> {
    let capacity = storage.capacity();
    if capacity < SUPERBLOCK_SIZE + CLUSTER_SIZE as u64 {
        error!("format: carrier capacity {capacity} too small for one cluster");
        return Err(FsError::NoSpace.into());
    }

    let cluster_count = std::cmp::min(0xFFFFu64, (capacity - SUPERBLOCK_SIZE) / CLUSTER_SIZE as u64);

    let mut cluster0 = ClusterRaw::zeroed();
    cluster0.used = 1;
    let header = (cluster_count as u16).to_le_bytes();
    let digest = header_md5(&header, &cluster0);

    storage.write_at(0, &digest)?;
    storage.write_at(16, &header)?;
    storage.write_at(SUPERBLOCK_SIZE, cluster0.as_bytes())?;

    for nr in 1..cluster_count {
        let mut raw = ClusterRaw::zeroed();
        storage.read_at(cluster_offset(nr), raw.as_mut_bytes())?;
        raw.used = 0;
        raw.next = U16::new(0);
        storage.write_at(cluster_offset(nr), raw.as_bytes())?;
    }

    info!("formatted {cluster_count} clusters ({} bytes payload each)", PAYLOAD_SIZE);
    Ok(())
}

/// Mounts a previously formatted `storage`, verifying the header/root MD5.
pub fn mount<DS: DataStorage>(storage: DS) -> Result<FileSystem<DS>> {
    let mut digest = [0u8; 16];
    storage.read_at(0, &mut digest)?;
    let mut header = [0u8; 2];
    storage.read_at(16, &mut header)?;
    let cluster_count = u16::from_le_bytes(header) as u64;

    let mut cluster0 = ClusterRaw::zeroed();
    storage.read_at(SUPERBLOCK_SIZE, cluster0.as_mut_bytes())?;

    if header_md5(&header, &cluster0) != digest {
        error!("mount: superblock MD5 mismatch, carrier corrupt or not formatted");
        return Err(FsError::Corrupt.into());
    }

    let store = ClusterStore::new(storage, cluster_count, 0);
    let mut free = 0u64;
    for nr in 1..cluster_count {
        if !store.used(nr)? {
            free += 1;
        }
    }
    store.set_free_clusters(free);

    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(FileSystem {
        store,
        uid,
        gid,
        mtime,
    })
}

impl<DS: DataStorage> FileSystem<DS> {
    /// Writes cluster 0 and a refreshed superblock MD5, then every other
    /// dirty cluster.
    pub fn sync(&self) -> Result<()> {
        let cluster0 = self.store.with_cluster(0, |c| c.clone())?;
        let header = (self.store.cluster_count() as u16).to_le_bytes();
        let digest = header_md5(&header, &cluster0);

        self.store.storage().write_at(0, &digest)?;
        self.store.storage().write_at(16, &header)?;
        self.store.flush(0)?;
        self.store.flush_dirty(1)?;
        Ok(())
    }

    /// Syncs and releases the filesystem handle.
    pub fn umount(self) -> Result<()> {
        self.sync()
    }
}
