use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, ZERO_BLOCK},
    fs::{
        config::{BITMAP_BLOCK_ID, BITS_PER_WORD, BLOCK_BITMAP_WORDS, INODE_BITMAP_WORDS, NUM_BLOCKS, NUM_INODES},
        error::Result,
    },
};

/// 分配位图（块 1）：先是块位图，后是 inode 位图，均按 32 位字打包
///
/// 第 `i` 位位于第 `i / 32` 个字的第 `i % 32` 位，置 1 表示已占用。
/// 这是内存中的副本：一次逻辑操作先 `load`，全部修改完成后 `sync` 一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    block_in_use: [u32; BLOCK_BITMAP_WORDS],
    inode_in_use: [u32; INODE_BITMAP_WORDS],
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn word_and_mask(index: u32) -> (usize, u32) {
    ((index / BITS_PER_WORD) as usize, 1 << (index % BITS_PER_WORD))
}

impl Bitmap {
    // 全部空闲
    pub fn new() -> Self {
        Self {
            block_in_use: [0; BLOCK_BITMAP_WORDS],
            inode_in_use: [0; INODE_BITMAP_WORDS],
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn encode(&self) -> Result<Block> {
        let mut block = ZERO_BLOCK;
        bincode::serialize_into(&mut block[..], self)?;
        Ok(block)
    }

    // 从磁盘加载位图
    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let mut block = ZERO_BLOCK;
        disk.read_block(BITMAP_BLOCK_ID as u64, &mut block)?;
        Self::decode(&block)
    }

    // 将位图写回磁盘
    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        trace!("writing bitmap block {}", BITMAP_BLOCK_ID);
        disk.write_block(BITMAP_BLOCK_ID as u64, &self.encode()?)?;
        Ok(())
    }

    /// 调用方保证 `block < NUM_BLOCKS`
    pub fn is_block_in_use(&self, block: u32) -> bool {
        debug_assert!(block < NUM_BLOCKS);
        let (word, mask) = word_and_mask(block);
        self.block_in_use[word] & mask != 0
    }

    /// 调用方保证 `inum < NUM_INODES`
    pub fn is_inode_in_use(&self, inum: u32) -> bool {
        debug_assert!(inum < NUM_INODES);
        let (word, mask) = word_and_mask(inum);
        self.inode_in_use[word] & mask != 0
    }

    pub fn mark_block_used(&mut self, block: u32) {
        debug_assert!(block < NUM_BLOCKS);
        let (word, mask) = word_and_mask(block);
        self.block_in_use[word] |= mask;
    }

    pub fn mark_block_free(&mut self, block: u32) {
        debug_assert!(block < NUM_BLOCKS);
        let (word, mask) = word_and_mask(block);
        self.block_in_use[word] &= !mask;
    }

    pub fn mark_inode_used(&mut self, inum: u32) {
        debug_assert!(inum < NUM_INODES);
        let (word, mask) = word_and_mask(inum);
        self.inode_in_use[word] |= mask;
    }

    pub fn mark_inode_free(&mut self, inum: u32) {
        debug_assert!(inum < NUM_INODES);
        let (word, mask) = word_and_mask(inum);
        self.inode_in_use[word] &= !mask;
    }

    /// 逐位统计已占用块数，不信任任何缓存计数
    pub fn blocks_in_use(&self) -> u32 {
        (0..NUM_BLOCKS).filter(|&b| self.is_block_in_use(b)).count() as u32
    }

    pub fn inodes_in_use(&self) -> u32 {
        (0..NUM_INODES).filter(|&i| self.is_inode_in_use(i)).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn bit_order_is_word_then_position() {
        let mut bitmap = Bitmap::new();
        bitmap.mark_block_used(0);
        bitmap.mark_block_used(33);
        bitmap.mark_inode_used(5);

        let block = bitmap.encode().unwrap();
        // 块位图字 0 的第 0 位
        assert_eq!(&block[0..4], &1u32.to_le_bytes());
        // 块位图字 1 的第 1 位
        assert_eq!(&block[4..8], &2u32.to_le_bytes());
        // inode 位图紧跟在 32 个块位图字之后
        let inode_words = BLOCK_BITMAP_WORDS * 4;
        assert_eq!(&block[inode_words..inode_words + 4], &(1u32 << 5).to_le_bytes());
    }

    #[test]
    fn persisted_bitmap_reloads_identically() {
        let disk = MemDisk::new(4);
        let mut bitmap = Bitmap::new();
        let blocks = [0, 1, 2, 31, 32, 500, 1023];
        let inodes = [1, 5, 64, 127];
        blocks.iter().for_each(|&b| bitmap.mark_block_used(b));
        inodes.iter().for_each(|&i| bitmap.mark_inode_used(i));
        bitmap.sync(&disk).unwrap();

        let reloaded = Bitmap::load(&disk).unwrap();
        assert_eq!(reloaded, bitmap);
        for b in 0..NUM_BLOCKS {
            assert_eq!(reloaded.is_block_in_use(b), blocks.contains(&b), "block {}", b);
        }
        for i in 0..NUM_INODES {
            assert_eq!(reloaded.is_inode_in_use(i), inodes.contains(&i), "inode {}", i);
        }
        assert_eq!(reloaded.blocks_in_use(), blocks.len() as u32);
        assert_eq!(reloaded.inodes_in_use(), inodes.len() as u32);
    }

    #[test]
    fn marking_free_clears_only_that_bit() {
        let mut bitmap = Bitmap::new();
        bitmap.mark_block_used(10);
        bitmap.mark_block_used(11);
        bitmap.mark_block_free(10);
        assert!(!bitmap.is_block_in_use(10));
        assert!(bitmap.is_block_in_use(11));

        // 重复释放不影响其它位
        bitmap.mark_block_free(10);
        assert_eq!(bitmap.blocks_in_use(), 1);

        bitmap.mark_inode_used(5);
        bitmap.mark_inode_free(5);
        assert_eq!(bitmap.inodes_in_use(), 0);
    }
}
