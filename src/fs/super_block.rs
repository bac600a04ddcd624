use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, ZERO_BLOCK},
    fs::{
        config::{ROOT_INODE, SUPER_BLOCK_BLOCK_ID, TFS_MAGIC},
        error::Result,
    },
};

/// 超级块（块 0），格式化时写入，此后只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub signature: u32,  // 魔数，用于识别文件系统
    pub num_blocks: u32, // 文件系统总块数
    pub num_inodes: u32, // 总 inode 数
    pub root_inode: u32, // 根目录 inode 编号
}

impl SuperBlock {
    pub fn new(num_blocks: u32, num_inodes: u32) -> Self {
        Self {
            signature: TFS_MAGIC,
            num_blocks,
            num_inodes,
            root_inode: ROOT_INODE,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.signature == TFS_MAGIC
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn encode(&self) -> Result<Block> {
        let mut block = ZERO_BLOCK;
        bincode::serialize_into(&mut block[..], self)?;
        Ok(block)
    }

    // 从磁盘加载超级块，不做合法性检查
    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let mut block = ZERO_BLOCK;
        disk.read_block(SUPER_BLOCK_BLOCK_ID as u64, &mut block)?;
        Self::decode(&block)
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        disk.write_block(SUPER_BLOCK_BLOCK_ID as u64, &self.encode()?)?;
        Ok(())
    }
}
