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

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("carrier: {0}")]
    Carrier(#[from] CarrierError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    #[error("fs: {0}")]
    Fs(#[from] FsError),
}

/// Carrier-parser failures: locating the payload region of a BMP or WAV
/// file.
#[derive(thiserror::Error, Debug)]
pub enum CarrierError {
    #[error("bad magic")]
    BadMagic,
    #[error("truncated container")]
    Truncated,
    #[error("unsupported compression")]
    UnsupportedCompression,
    #[error("unsupported pixel orientation")]
    UnsupportedOrientation,
}

/// LSB codec failures.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("offset {offset} + len {len} exceeds capacity {capacity}")]
    OutOfRange {
        offset: u64,
        len: u64,
        capacity: u64,
    },
}

/// Filesystem-engine failures.
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("invalid argument")]
    Invalid,
    #[error("not found")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("name too long")]
    NameTooLong,
    #[error("already exists")]
    Exists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no space left")]
    NoSpace,
    #[error("size too large")]
    TooLarge,
    #[error("offset overflow")]
    Overflow,
    #[error("cluster index out of range")]
    OutOfRange,
    #[error("corrupt filesystem")]
    Corrupt,
}

pub type Result<T> = std::result::Result<T, Error>;
