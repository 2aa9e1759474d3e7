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

//! Allocator: finds and reserves free clusters, links them into chains, and
//! releases chains back to the free pool.

use ghostfs_ds::DataStorage;
use ghostfs_err::{FsError, Result};
use log::warn;

use crate::cluster::ClusterStore;

impl<DS: DataStorage> ClusterStore<DS> {
    /// Allocates `count` clusters (clusters 1..cluster_count, cluster 0 is
    /// always the reserved root), chains them together, and returns the
    /// first cluster's index. Rolls back any clusters already claimed if
    /// the scan runs out of free space.
    pub fn alloc_chain(&self, count: u64, zero_payload: bool) -> Result<u64> {
        if count == 0 {
            return Err(FsError::Invalid.into());
        }

        let mut claimed = Vec::with_capacity(count as usize);
        for nr in 1..self.cluster_count() {
            if claimed.len() as u64 == count {
                break;
            }
            if !self.used(nr)? {
                self.set_used(nr, true)?;
                if zero_payload {
                    self.zero_payload(nr)?;
                }
                self.dec_free();
                claimed.push(nr);
            }
        }

        if claimed.len() as u64 != count {
            warn!(
                "allocator: requested {count} clusters, only {} available",
                claimed.len()
            );
            for &nr in &claimed {
                self.set_used(nr, false)?;
                self.inc_free();
            }
            return Err(FsError::NoSpace.into());
        }

        for pair in claimed.windows(2) {
            self.set_next(pair[0], pair[1] as u16)?;
        }
        self.set_next(*claimed.last().unwrap(), 0)?;

        Ok(claimed[0])
    }

    /// Frees every cluster in the chain starting at `first_cluster`. Does
    /// not touch `next` pointers; they're overwritten on the next
    /// `alloc_chain`.
    pub fn free_chain(&self, first_cluster: u64) -> Result<()> {
        let mut cur = first_cluster;
        loop {
            let next = self.next(cur)?;
            self.set_used(cur, false)?;
            self.inc_free();
            if next == 0 {
                break;
            }
            cur = next as u64;
        }
        Ok(())
    }
}
