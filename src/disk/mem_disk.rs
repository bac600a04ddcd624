use std::{io::Result, sync::Mutex};

use crate::disk::{
    block_device::{out_of_range, poisoned, BlockDevice},
    types::{Block, BLOCK_SIZE},
};

/// 内存盘：所有块保存在一段连续的字节数组中
#[derive(Debug)]
pub struct MemDisk {
    inner: Mutex<Vec<u8>>,
    num_blocks: u64,
}

impl MemDisk {
    pub fn new(num_blocks: u64) -> Self {
        Self {
            inner: Mutex::new(vec![0u8; num_blocks as usize * BLOCK_SIZE]),
            num_blocks,
        }
    }

    /// 从已有的镜像字节构造，不足一块的尾部补零
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let num_blocks = bytes.len().div_ceil(BLOCK_SIZE);
        bytes.resize(num_blocks * BLOCK_SIZE, 0);
        Self {
            inner: Mutex::new(bytes),
            num_blocks: num_blocks as u64,
        }
    }

    /// 取回全部字节（镜像快照）
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 复制当前全部字节，用于比较前后状态
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(self.inner.lock().map_err(|_| poisoned())?.clone())
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id, self.num_blocks));
        }
        let start = block_id as usize * BLOCK_SIZE;
        let data = self.inner.lock().map_err(|_| poisoned())?;
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id, self.num_blocks));
        }
        let start = block_id as usize * BLOCK_SIZE;
        let mut data = self.inner.lock().map_err(|_| poisoned())?;
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn num_blocks(&self) -> u64 {
        self.num_blocks
    }
}
