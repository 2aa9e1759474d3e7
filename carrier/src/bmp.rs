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
use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Carrier;

/// Uncompressed, bottom-up BMP. The pixel array is treated as the payload;
/// row-padding bytes (present whenever a row isn't a multiple of 4 bytes)
/// are never touched so they carry no hidden data and never move.
pub struct Bmp {
    file: File,
    pixel_data_offset: u64,
    row_bytes: u64,
    row_stride: u64,
    height: u64,
}

impl Bmp {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut buf = [0u8; size_of::<FileHeader>()];
        file.read_exact_at(&mut buf, 0)?;
        let file_header =
            FileHeader::read_from_bytes(&buf).map_err(|_| CarrierError::Truncated)?;
        if file_header.signature != *b"BM" {
            warn!("bmp: bad file signature, not a BMP");
            return Err(CarrierError::BadMagic.into());
        }

        let mut buf = [0u8; size_of::<DibHeader>()];
        file.read_exact_at(&mut buf, size_of::<FileHeader>() as u64)?;
        let dib = DibHeader::read_from_bytes(&buf).map_err(|_| CarrierError::Truncated)?;
        if dib.header_size.get() != size_of::<DibHeader>() as u32 {
            warn!("bmp: unsupported DIB header size {}", dib.header_size.get());
            return Err(CarrierError::UnsupportedCompression.into());
        }
        if dib.planes.get() != 1 {
            warn!("bmp: unsupported plane count {}", dib.planes.get());
            return Err(CarrierError::BadMagic.into());
        }
        if dib.compression.get() != 0 {
            warn!("bmp: compressed bitmaps are unsupported");
            return Err(CarrierError::UnsupportedCompression.into());
        }
        let bits_per_pixel = dib.bits_per_pixel.get() as u64;
        if bits_per_pixel == 0 || bits_per_pixel % 8 != 0 {
            warn!("bmp: unsupported bit depth {bits_per_pixel}");
            return Err(CarrierError::UnsupportedCompression.into());
        }

        let height_raw = dib.height.get();
        if height_raw <= 0 {
            // Top-down DIBs (negative height) are rejected; a zero-height
            // bitmap carries no samples and is equally unsupported.
            warn!("bmp: top-down or zero-height bitmaps are unsupported");
            return Err(CarrierError::UnsupportedOrientation.into());
        }
        let height = height_raw as u64;
        let width = dib.width.get().max(0) as u64;

        let row_bytes = width * (bits_per_pixel / 8);
        let row_stride = (row_bytes + 3) & !3;
        let pixel_data_offset = file_header.pixel_data_offset.get() as u64;

        let required_len = pixel_data_offset + row_stride * height;
        if file.metadata()?.len() < required_len {
            warn!("bmp: file truncated before end of pixel data");
            return Err(CarrierError::Truncated.into());
        }

        Ok(Self {
            file,
            pixel_data_offset,
            row_bytes,
            row_stride,
            height,
        })
    }

    fn sample_file_offset(&self, index: u64) -> u64 {
        let row = index / self.row_bytes;
        let col = index % self.row_bytes;
        self.pixel_data_offset + row * self.row_stride + col
    }
}

impl Carrier for Bmp {
    fn sample_count(&self) -> u64 {
        self.row_bytes * self.height
    }

    fn read_sample(&self, index: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact_at(&mut buf, self.sample_file_offset(index))?;
        Ok(buf[0])
    }

    fn write_sample(&self, index: u64, value: u8) -> Result<()> {
        self.file
            .write_all_at(&[value], self.sample_file_offset(index))?;
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct FileHeader {
    signature: [u8; 2],
    file_size: U32,
    reserved1: U16,
    reserved2: U16,
    pixel_data_offset: U32,
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct DibHeader {
    header_size: U32,
    width: I32,
    height: I32,
    planes: U16,
    bits_per_pixel: U16,
    compression: U32,
    image_size: U32,
    x_pixels_per_meter: I32,
    y_pixels_per_meter: I32,
    colors_used: U32,
    colors_important: U32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_bmp(path: &Path, width: i32, height: i32) {
        let bits_per_pixel = 24u16;
        let row_bytes = width as u32 * (bits_per_pixel as u32 / 8);
        let row_stride = (row_bytes + 3) & !3;
        let pixel_data_offset = (size_of::<FileHeader>() + size_of::<DibHeader>()) as u32;
        let pixel_len = row_stride * height as u32;

        let file_header = FileHeader {
            signature: *b"BM",
            file_size: U32::new(pixel_data_offset + pixel_len),
            reserved1: U16::new(0),
            reserved2: U16::new(0),
            pixel_data_offset: U32::new(pixel_data_offset),
        };
        let dib = DibHeader {
            header_size: U32::new(size_of::<DibHeader>() as u32),
            width: I32::new(width),
            height: I32::new(height),
            planes: U16::new(1),
            bits_per_pixel: U16::new(bits_per_pixel),
            compression: U32::new(0),
            image_size: U32::new(pixel_len),
            x_pixels_per_meter: I32::new(0),
            y_pixels_per_meter: I32::new(0),
            colors_used: U32::new(0),
            colors_important: U32::new(0),
        };

        let mut file = File::create(path).unwrap();
        file.write_all(file_header.as_bytes()).unwrap();
        file.write_all(dib.as_bytes()).unwrap();
        file.write_all(&vec![0u8; pixel_len as usize]).unwrap();
    }

    #[test]
    fn sample_count_excludes_padding() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_bmp_padding.bmp");
        // width=3, 24bpp -> row_bytes=9, row_stride=12 (3 bytes padding)
        write_test_bmp(&path, 3, 2);
        let bmp = Bmp::open(&path).unwrap();
        assert_eq!(bmp.sample_count(), 9 * 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_write_round_trips_without_touching_padding() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_bmp_rw.bmp");
        write_test_bmp(&path, 3, 2);
        let bmp = Bmp::open(&path).unwrap();
        for i in 0..bmp.sample_count() {
            bmp.write_sample(i, (i * 7 + 3) as u8).unwrap();
        }
        for i in 0..bmp.sample_count() {
            assert_eq!(bmp.read_sample(i).unwrap(), (i * 7 + 3) as u8);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = std::env::temp_dir();
        let path = dir.join("ghostfs_test_bmp_bad_magic.bmp");
        std::fs::write(&path, vec![0u8; 128]).unwrap();
        assert!(Bmp::open(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
