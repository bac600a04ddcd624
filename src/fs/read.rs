use log::{debug, trace};

use crate::{
    disk::{BlockDevice, BLOCK_SIZE, ZERO_BLOCK},
    fs::{
        config::POINTERS_PER_INODE,
        error::{FileSystemError, Result},
        indirect::IndirectBlock,
        inode_table::load_inode,
        split_offset, FileSystem,
    },
};

impl<D: BlockDevice> FileSystem<D> {
    /// 从 `offset` 开始读取最多 `buf.len()` 字节，返回实际复制的字节数
    ///
    /// 超过文件末尾的部分被截断而不是报错；`offset >= size` 时返回 0。
    /// 第一个为 0 的直接指针视为已分配区域的结尾。
    pub fn read(&self, inum: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        if inum >= self.super_block.num_inodes {
            return Err(FileSystemError::InodeOutOfRange(inum));
        }

        let (inode, _, _) = load_inode(&self.disk, inum)?;
        let size = inode.size as usize;
        debug!(
            "[inode #{}] read (offset = {}; len = {}; size = {})",
            inum,
            offset,
            buf.len(),
            size
        );
        if offset >= size {
            return Ok(0);
        }

        let length = buf.len().min(size - offset);
        let out = &mut buf[..length];
        let (start_index, mut intra) = split_offset(offset);
        let mut copied = 0;

        // 直接块区域
        let mut index = start_index;
        while index < POINTERS_PER_INODE && copied < length {
            let block_id = inode.direct[index];
            if block_id == 0 {
                trace!("[inode #{}] direct[{}] empty, stop", inum, index);
                return Ok(copied);
            }
            copied += self.copy_from_block(block_id, intra, &mut out[copied..])?;
            intra = 0;
            index += 1;
        }

        // 间接块区域，起点按逻辑块号换算
        if copied < length && inode.has_indirect() {
            let indirect = IndirectBlock::load(&self.disk, inode.indirect)?;
            let indirect_start = start_index.saturating_sub(POINTERS_PER_INODE);
            for block_id in indirect.blocks_from(indirect_start) {
                copied += self.copy_from_block(block_id, intra, &mut out[copied..])?;
                intra = 0;
                if copied >= length {
                    break;
                }
            }
        }

        Ok(copied)
    }

    // 从数据块的 `intra` 处复制，直到块尾或 `out` 写满
    fn copy_from_block(&self, block_id: u32, intra: usize, out: &mut [u8]) -> Result<usize> {
        let mut block = ZERO_BLOCK;
        self.disk.read_block(block_id as u64, &mut block)?;
        let n = (BLOCK_SIZE - intra).min(out.len());
        out[..n].copy_from_slice(&block[intra..intra + n]);
        trace!("copied {} bytes from block {}", n, block_id);
        Ok(n)
    }
}
