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

//! Carrier parsing: locating the byte range of payload samples within a BMP
//! or WAV file. Each sample is one byte; its low bit carries one filesystem
//! bit once wrapped by `ghostfs_codec::LsbCodec`.

mod bmp;
mod wav;

pub use bmp::Bmp;
pub use wav::Wav;

use ghostfs_err::Result;

/// A media file exposing a flat sequence of one-byte samples.
pub trait Carrier {
    /// Number of samples available for LSB packing.
    fn sample_count(&self) -> u64;

    /// Read the raw byte of sample `index`.
    fn read_sample(&self, index: u64) -> Result<u8>;

    /// Overwrite the raw byte of sample `index`.
    fn write_sample(&self, index: u64, value: u8) -> Result<()>;
}
