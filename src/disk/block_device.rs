use std::io::{Error, ErrorKind, Result};

use crate::disk::types::Block;

/// 块设备抽象：一组编号连续、大小固定的块。
///
/// 文件系统只通过块号访问设备，从不关心物理存储。
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()>;

    /// 设备中的块总数
    fn num_blocks(&self) -> u64;
}

impl<T: BlockDevice + ?Sized> BlockDevice for &T {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        (**self).read_block(block_id, buf)
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        (**self).write_block(block_id, buf)
    }

    fn num_blocks(&self) -> u64 {
        (**self).num_blocks()
    }
}

/// 块号越界时返回的统一错误
pub(crate) fn out_of_range(block_id: u64, num_blocks: u64) -> Error {
    Error::new(
        ErrorKind::InvalidInput,
        format!("block {} out of range (device has {} blocks)", block_id, num_blocks),
    )
}

/// 锁中毒时返回的统一错误
pub(crate) fn poisoned() -> Error {
    Error::new(ErrorKind::Other, "disk lock poisoned")
}
