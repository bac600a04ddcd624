use crate::disk::BLOCK_SIZE;

/// 魔数，用于识别文件系统（4MB 配置）
pub const TFS_MAGIC: u32 = 0xC345_0545;

pub const SUPER_BLOCK_BLOCK_ID: u32 = 0;
pub const BITMAP_BLOCK_ID: u32 = 1;
pub const INODE_TABLE_START_BLOCK_ID: u32 = 2;

/// 位图能描述的块数与 inode 数（位图只占一个块）
pub const NUM_BLOCKS: u32 = 1024;
pub const NUM_INODES: u32 = 128;

pub const BITS_PER_WORD: u32 = 32;
pub const BLOCK_BITMAP_WORDS: usize = (NUM_BLOCKS / BITS_PER_WORD) as usize;
pub const INODE_BITMAP_WORDS: usize = (NUM_INODES / BITS_PER_WORD) as usize;

// 每个 Inode 32 字节，一个 4KB 块可以存 128 个 Inode
pub const INODE_SIZE: usize = 32;
pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / INODE_SIZE) as u32;

pub const POINTERS_PER_INODE: usize = 5;
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// 单个文件最多能寻址的字节数（5 个直接块 + 一个间接块）
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

// 目录项：valid(4) + 文件名(24) + inum(4)
pub const FILE_NAME_LEN: usize = 24;
pub const DIR_ENTRY_SIZE: usize = 32;
pub const NUM_DENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

/// 根目录 inode 编号
pub const ROOT_INODE: u32 = 1;

/// 容纳 `num_inodes` 个 inode 所需的 inode 表块数
pub const fn inode_table_blocks(num_inodes: u32) -> u32 {
    num_inodes.div_ceil(INODES_PER_BLOCK)
}
