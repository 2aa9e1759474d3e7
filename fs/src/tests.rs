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

//! End-to-end scenarios over an in-memory carrier.

use std::rc::Rc;

use ghostfs_ds::MemStorage;
use ghostfs_err::{Error, FsError};

use crate::{format, mount};

fn fresh(capacity: usize) -> Rc<MemStorage> {
    let storage = Rc::new(MemStorage::new(capacity));
    format(&storage).unwrap();
    storage
}

#[test]
fn format_mount_empty() {
    let capacity = 10 * 1024 * 1024;
    let storage = fresh(capacity);
    let fs = mount(storage).unwrap();

    let stat = fs.statvfs();
    let expected_blocks = std::cmp::min(0xFFFFu64, (capacity as u64 - 18) / 4096);
    assert_eq!(stat.bsize, 4096);
    assert_eq!(stat.blocks, expected_blocks);
    assert_eq!(stat.bfree, expected_blocks - 1);
}

#[test]
fn create_and_read() {
    let fs = mount(fresh(1 << 20)).unwrap();
    fs.create("/a.txt").unwrap();
    let mut h = fs.open("/a.txt").unwrap();
    let n = fs.write_handle(&mut h, b"hello", 0).unwrap();
    assert_eq!(n, 5);

    let mut buf = [0u8; 5];
    let n = fs.read_handle(&h, &mut buf, 0).unwrap();
    assert_eq!(n, 5);
    assert_eq!(&buf, b"hello");

    assert_eq!(fs.getattr("/a.txt").unwrap().size, 5);
}

#[test]
fn chain_growth_and_shrink() {
    let fs = mount(fresh(1 << 20)).unwrap();
    fs.create("/big").unwrap();
    let mut h = fs.open("/big").unwrap();
    let data = vec![0x42u8; 10_000];
    fs.write_handle(&mut h, &data, 0).unwrap();
    assert_eq!(fs.getattr("/big").unwrap().size, 10_000);

    let free_before = fs.statvfs().bfree;
    fs.truncate_handle(&mut h, 100).unwrap();
    assert_eq!(fs.getattr("/big").unwrap().size, 100);
    let free_after = fs.statvfs().bfree;
    assert_eq!(free_after, free_before + 2);
}

#[test]
fn nested_directories() {
    let fs = mount(fresh(1 << 20)).unwrap();
    let free_initial = fs.statvfs().bfree;

    fs.mkdir("/d").unwrap();
    fs.mkdir("/d/e").unwrap();
    fs.create("/d/e/f").unwrap();

    match fs.rmdir("/d") {
        Err(Error::Fs(FsError::NotEmpty)) => {}
        other => panic!("expected not-empty, got {other:?}"),
    }

    fs.unlink("/d/e/f").unwrap();
    fs.rmdir("/d/e").unwrap();
    fs.rmdir("/d").unwrap();

    assert_eq!(fs.statvfs().bfree, free_initial);
}

#[test]
fn rename_replaces_existing_file() {
    let fs = mount(fresh(1 << 20)).unwrap();
    fs.create("/a").unwrap();
    let mut a = fs.open("/a").unwrap();
    fs.write_handle(&mut a, b"A", 0).unwrap();

    fs.create("/b").unwrap();
    let mut b = fs.open("/b").unwrap();
    fs.write_handle(&mut b, b"BB", 0).unwrap();

    fs.rename("/a", "/b").unwrap();

    let h = fs.open("/b").unwrap();
    let mut buf = [0u8; 1];
    fs.read_handle(&h, &mut buf, 0).unwrap();
    assert_eq!(&buf, b"A");

    match fs.open("/a") {
        Err(Error::Fs(FsError::NotFound)) => {}
        other => panic!("expected not-found, got {other:?}"),
    }
}

#[test]
fn persistence_and_corruption_detection() {
    let storage = fresh(1 << 20);
    {
        let fs = mount(storage.clone()).unwrap();
        fs.create("/a.txt").unwrap();
        let mut h = fs.open("/a.txt").unwrap();
        fs.write_handle(&mut h, b"hello", 0).unwrap();
        fs.sync().unwrap();
    }

    {
        let fs = mount(storage.clone()).unwrap();
        let h = fs.open("/a.txt").unwrap();
        let mut buf = [0u8; 5];
        fs.read_handle(&h, &mut buf, 0).unwrap();
        assert_eq!(&buf, b"hello");
    }

    // Flip one sample's value inside cluster 0's payload, bypassing the
    // codec so the superblock MD5 no longer matches.
    let mut byte = [0u8; 1];
    ghostfs_ds::DataStorage::read_at(&storage, 18, &mut byte).unwrap();
    byte[0] ^= 0xFF;
    ghostfs_ds::DataStorage::write_at(&storage, 18, &byte).unwrap();

    match mount(storage) {
        Err(Error::Fs(FsError::Corrupt)) => {}
        other => panic!("expected corrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn minimal_capacity_fits_one_cluster_and_rejects_create() {
    let capacity = 18 + 4096;
    let fs = mount(fresh(capacity)).unwrap();

    assert_eq!(fs.statvfs().blocks, 1);

    match fs.create("/a") {
        Err(Error::Fs(FsError::NoSpace)) => {}
        other => panic!("expected no-space, got {other:?}"),
    }
    match fs.mkdir("/d") {
        Err(Error::Fs(FsError::NoSpace)) => {}
        other => panic!("expected no-space, got {other:?}"),
    }
}
