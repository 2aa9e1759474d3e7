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

//! LSB codec: packs caller bytes into the low bit of successive carrier
//! samples, most-significant bit first, and presents the result as a
//! `DataStorage`.

use ghostfs_carrier::Carrier;
use ghostfs_ds::DataStorage;
use ghostfs_err::{CodecError, Result};
use log::warn;

pub struct LsbCodec<C: Carrier> {
    carrier: C,
}

impl<C: Carrier> LsbCodec<C> {
    pub fn new(carrier: C) -> Self {
        Self { carrier }
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        if offset + len > self.capacity() {
            warn!(
                "codec: access offset {offset} + len {len} exceeds capacity {}",
                self.capacity()
            );
            return Err(CodecError::OutOfRange {
                offset,
                len,
                capacity: self.capacity(),
            }
            .into());
        }
        Ok(())
    }
}

impl<C: Carrier> DataStorage for LsbCodec<C> {
    fn capacity(&self) -> u64 {
        self.carrier.sample_count() / 8
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        self.check_range(offset, buffer.len() as u64)?;
        for (i, out) in buffer.iter_mut().enumerate() {
            let base = (offset + i as u64) * 8;
            let mut byte = 0u8;
            for bit in 0..8 {
                let sample = self.carrier.read_sample(base + bit)?;
                byte = (byte << 1) | (sample & 1);
            }
            *out = byte;
        }
        Ok(())
    }

    fn write_at(&self, offset: u64, buffer: &[u8]) -> Result<()> {
        self.check_range(offset, buffer.len() as u64)?;
        for (i, &byte) in buffer.iter().enumerate() {
            let base = (offset + i as u64) * 8;
            for bit in 0..8 {
                let source_bit = (byte >> (7 - bit)) & 1;
                let sample = self.carrier.read_sample(base + bit)?;
                self.carrier.write_sample(base + bit, (sample & !1) | source_bit)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory carrier standing in for a BMP/WAV file in codec tests.
    struct MemCarrier {
        samples: RefCell<Vec<u8>>,
    }

    impl MemCarrier {
        fn new(n: usize) -> Self {
            Self {
                samples: RefCell::new(vec![0xAAu8; n]),
            }
        }
    }

    impl Carrier for MemCarrier {
        fn sample_count(&self) -> u64 {
            self.samples.borrow().len() as u64
        }

        fn read_sample(&self, index: u64) -> Result<u8> {
            Ok(self.samples.borrow()[index as usize])
        }

        fn write_sample(&self, index: u64, value: u8) -> Result<()> {
            self.samples.borrow_mut()[index as usize] = value;
            Ok(())
        }
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let codec = LsbCodec::new(MemCarrier::new(8 * 64));
        let data: Vec<u8> = (0..64u32).map(|i| (i * 37 + 5) as u8).collect();
        codec.write_at(0, &data).unwrap();
        let mut out = vec![0u8; data.len()];
        codec.read_at(0, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn only_low_bit_of_each_sample_changes() {
        let carrier = MemCarrier::new(8 * 4);
        let codec = LsbCodec::new(carrier);
        codec.write_at(0, &[0xFF, 0x00, 0x55, 0x81]).unwrap();
        for sample in codec.carrier.samples.borrow().iter() {
            assert_eq!(sample & !1, 0xAA & !1);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        let codec = LsbCodec::new(MemCarrier::new(8 * 4));
        let mut out = [0u8; 5];
        assert!(codec.read_at(0, &mut out).is_err());
    }

    #[test]
    fn capacity_is_sample_count_divided_by_eight() {
        let codec = LsbCodec::new(MemCarrier::new(8 * 4 + 3));
        assert_eq!(codec.capacity(), 4);
    }
}
