use crate::{
    disk::{Block, BlockDevice, ZERO_BLOCK},
    fs::{config::POINTERS_PER_BLOCK, error::Result},
};

/// 一级间接块：1024 个块号，0 表示后面没有更多数据块
///
/// 只有 inode 的 `indirect != 0` 时才可以读取，块号 0 是超级块。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectBlock {
    pointers: [u32; POINTERS_PER_BLOCK],
}

impl Default for IndirectBlock {
    fn default() -> Self {
        Self {
            pointers: [0; POINTERS_PER_BLOCK],
        }
    }
}

impl IndirectBlock {
    pub fn decode(block: &Block) -> Self {
        let mut pointers = [0u32; POINTERS_PER_BLOCK];
        for (ptr, raw) in pointers.iter_mut().zip(block.chunks_exact(4)) {
            *ptr = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        Self { pointers }
    }

    pub fn encode(&self) -> Block {
        let mut block = ZERO_BLOCK;
        for (raw, ptr) in block.chunks_exact_mut(4).zip(self.pointers.iter()) {
            raw.copy_from_slice(&ptr.to_le_bytes());
        }
        block
    }

    pub fn load<D: BlockDevice>(disk: &D, block_id: u32) -> Result<Self> {
        let mut block = ZERO_BLOCK;
        disk.read_block(block_id as u64, &mut block)?;
        Ok(Self::decode(&block))
    }

    pub fn pointers(&self) -> &[u32; POINTERS_PER_BLOCK] {
        &self.pointers
    }

    pub fn pointers_mut(&mut self) -> &mut [u32; POINTERS_PER_BLOCK] {
        &mut self.pointers
    }

    /// 从下标 `start` 开始的数据块，遇到第一个 0 停止
    pub fn blocks_from(&self, start: usize) -> impl Iterator<Item = u32> + '_ {
        self.pointers
            .iter()
            .skip(start)
            .copied()
            .take_while(|&block| block != 0)
    }

    /// 所有非零项（不在 0 处停止），带下标
    pub fn non_zero(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.pointers
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, block)| block != 0)
    }
}
