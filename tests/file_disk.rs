mod common;

use std::{fs, io::ErrorKind, path::PathBuf};

use common::hello_image;
use tiny_fs::{BlockDevice, FileDisk, FileSystem, BLOCK_SIZE};
use uuid::Uuid;

fn temp_image_path() -> PathBuf {
    std::env::temp_dir().join(format!("tinyfs-{}.img", Uuid::new_v4()))
}

#[test]
fn image_file_round_trip() {
    let path = temp_image_path();
    let (mem, data) = hello_image();

    {
        let disk = FileDisk::create(&path, mem.num_blocks()).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        for block_id in 0..mem.num_blocks() {
            mem.read_block(block_id, &mut block).unwrap();
            disk.write_block(block_id, &block).unwrap();
        }
    }

    let disk = FileDisk::open(&path).unwrap();
    assert_eq!(disk.num_blocks(), 1024);
    let mut tfs = FileSystem::open(disk).unwrap();
    assert_eq!(tfs.read_to_vec("hello.txt").unwrap(), data);
    tfs.delete("hello.txt").unwrap();
    drop(tfs);

    // 重新打开后删除结果仍然存在
    let tfs = FileSystem::open(FileDisk::open(&path).unwrap()).unwrap();
    assert!(tfs.resolve("hello.txt").is_err());
    assert!(tfs.list_root().unwrap().is_empty());

    fs::remove_file(&path).unwrap();
}

#[test]
fn open_rejects_partial_blocks() {
    let path = temp_image_path();
    fs::write(&path, vec![0u8; BLOCK_SIZE + 1]).unwrap();
    let err = FileDisk::open(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    fs::remove_file(&path).unwrap();
}

#[test]
fn reads_beyond_image_fail() {
    let path = temp_image_path();
    let disk = FileDisk::create(&path, 2).unwrap();
    let mut block = [0u8; BLOCK_SIZE];
    disk.read_block(1, &mut block).unwrap();
    assert_eq!(
        disk.read_block(2, &mut block).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
    fs::remove_file(&path).unwrap();
}
