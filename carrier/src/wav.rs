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

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use ghostfs_err::{CarrierError, Result};
use log::warn;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Carrier;

/// RIFF/WAVE PCM carrier. Every byte of the `data` sub-chunk is a sample;
/// the sample's interpretation as audio is irrelevant, only its LSB.
pub struct Wav {
    file: File,
    data_offset: u64,
    data_size: u64,
}

impl Wav {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let file_len = file.metadata()?.len();

        let mut buf = [0u8; size_of::<RiffHeader>()];
        file.read_exact_at(&mut buf, 0)?;
        let riff = RiffHeader::read_from_bytes(&buf).map_err(|_| CarrierError::Truncated)?;
        if riff.chunk_id != *b"RIFF" || riff.format != *b"WAVE" {
            warn!("wav: bad RIFF/WAVE magic");
            return Err(CarrierError::BadMagic.into());
        }

        let mut offset = size_of::<RiffHeader>() as u64;
        loop {
            if offset + size_of::<ChunkHeader>() as u64 > file_len {
                warn!("wav: file truncated while scanning chunks");
                return Err(CarrierError::Truncated.into());
            }
            let mut buf = [0u8; size_of::<ChunkHeader>()];
            file.read_exact_at(&mut buf, offset)?;
            let chunk = ChunkHeader::read_from_bytes(&buf).map_err(|_| CarrierError::Truncated)?;
            let chunk_data_offset = offset + size_of::<ChunkHeader>() as u64;
            let chunk_size = chunk.chunk_size.get() as u64;

            if chunk.chunk_id == *b"data" {
                if chunk_data_offset + chunk_size > file_len {
                    warn!("wav: data chunk extends past end of file");
                    return Err(CarrierError::Truncated.into());
                }
                return Ok(Self {
                    file,
                    data_offset: chunk_data_offset,
                    data_size: chunk_size,
                });
            }

            // RIFF chunks are word-aligned; a pad byte follows odd sizes.
            offset = chunk_data_offset + chunk_size + (chunk_size & 1);
        }
    }
}

impl Carrier for Wav {
    fn sample_count(&self) -> u64 {
        self.data_size
    }

    fn read_sample(&self, index: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact_at(&mut buf, self.data_offset + index)?;
        Ok(buf[0])
    }

    fn write_sample(&self, index: u64, value: u8) -> Result<()> {
        self.file
            .write_all_at(&[value], self.data_offset + index)?;
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct RiffHeader {
    chunk_id: [u8; 4],
    chunk_size: U32,
    format: [u8; 4],
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct ChunkHeader {
    chunk_id: [u8; 4],
    chunk_size: U32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_wav(path: &Path, data_len: u32) {
        let mut file = File::create(path).unwrap();

        let fmt_chunk_size = 16u32;
        let data = vec![0u8; data_len as usize];
        let riff_size = 4 /* WAVE */
            + 8 + fmt_chunk_size
            + 8 + data_len + (data_len & 1);

        file.write_all(b"RIFF").unwrap();
        file.write_all(&riff_size.to_le_bytes()).unwrap();
        file.write_all(b"WAVE").unwrap();

        file.write_all(b"fmt ").unwrap();
        file.write_all(&fmt_chunk_size.to_le_bytes()).unwrap();
        file.write_all(&[0u8; 16]).unwrap(); // dummy fmt payload

        file.write_all(b"data").unwrap();
        file.write_all(&data_len.to_le_bytes()).unwrap();
        file.write_all(&data).unwrap();
        if data_len & 1 != 0 {
            file.write_all(&[0u8]).unwrap();
        }
    }

    #[test]
    fn locates_data_chunk_after_fmt() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_wav_fmt.wav");
        write_test_wav(&path, 100);
        let wav = Wav::open(&path).unwrap();
        assert_eq!(wav.sample_count(), 100);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_write_round_trips() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_wav_rw.wav");
        write_test_wav(&path, 50);
        let wav = Wav::open(&path).unwrap();
        for i in 0..wav.sample_count() {
            wav.write_sample(i, (i * 3 + 1) as u8).unwrap();
        }
        for i in 0..wav.sample_count() {
            assert_eq!(wav.read_sample(i).unwrap(), (i * 3 + 1) as u8);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_wav_bad_magic.wav");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        assert!(Wav::open(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
