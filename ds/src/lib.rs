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

//! Flat byte-addressable storage backing the filesystem engine.
//!
//! The cluster store (`ghostfs_fs`) is generic over any `DataStorage`
//! implementation, the same way the filesystem engine this one is modeled
//! after is generic over its own storage trait. Here the concrete
//! implementation is `ghostfs_codec::LsbCodec`, which presents a carrier's
//! sample LSBs as a flat byte stream; tests use an in-memory implementation
//! instead.

use ghostfs_err::Result;

pub trait DataStorage {
    /// Number of addressable bytes.
    fn capacity(&self) -> u64;

    /// Read `buffer.len()` bytes starting at `offset`.
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()>;

    /// Write `buffer.len()` bytes starting at `offset`.
    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()>;
}

impl<T: DataStorage + ?Sized> DataStorage for std::rc::Rc<T> {
    fn capacity(&self) -> u64 {
        (**self).capacity()
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buffer)
    }

    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()> {
        (**self).write_at(offset, buffer)
    }
}

/// In-memory `DataStorage` used by filesystem-engine tests so they don't
/// need a real BMP/WAV fixture.
pub struct MemStorage {
    bytes: std::cell::RefCell<Vec<u8>>,
}

impl MemStorage {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: std::cell::RefCell::new(vec![0u8; capacity]),
        }
    }
}

impl DataStorage for MemStorage {
    fn capacity(&self) -> u64 {
        self.bytes.borrow().len() as u64
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let bytes = self.bytes.borrow();
        let start = offset as usize;
        buffer.copy_from_slice(&bytes[start..start + buffer.len()]);
        Ok(())
    }

    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.borrow_mut();
        let start = offset as usize;
        bytes[start..start + buffer.len()].copy_from_slice(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_storage_round_trips() {
        let storage = MemStorage::new(64);
        storage.write_at(8, b"hello").unwrap();
        let mut buf = [0u8; 5];
        storage.read_at(8, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }
}
