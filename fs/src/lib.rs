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

//! Cluster-based filesystem engine sitting on any `ghostfs_ds::DataStorage`.
//! The carrier/codec crates supply the concrete storage; this crate never
//! touches a file or a pixel directly.

mod alloc;
mod api;
mod cluster;
mod dir;
mod dirent;
mod file;
mod superblock;
#[cfg(test)]
mod tests;

pub use api::{Attr, DirHandle, FileHandle, StatVfs};
pub use cluster::{ClusterStore, CLUSTER_SIZE, PAYLOAD_SIZE, SUPERBLOCK_SIZE};
pub use dirent::{Entry, EntryRef, MAX_NAME_LEN};
pub use superblock::{format, mount};

use ghostfs_ds::DataStorage;

/// The mounted filesystem handle.
pub struct FileSystem<DS: DataStorage> {
    store: ClusterStore<DS>,
    uid: u32,
    gid: u32,
    mtime: u64,
}
