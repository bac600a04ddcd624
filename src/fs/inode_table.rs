use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, ZERO_BLOCK},
    fs::{
        config::{INODES_PER_BLOCK, INODE_SIZE, INODE_TABLE_START_BLOCK_ID, POINTERS_PER_INODE},
        error::Result,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Regular,   // 普通文件
    Directory, // 目录
}

impl InodeType {
    pub const REGULAR: u32 = 1;
    pub const DIR: u32 = 2;

    /// 0 或未知值表示空闲 inode
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            Self::REGULAR => Some(Self::Regular),
            Self::DIR => Some(Self::Directory),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Regular => Self::REGULAR,
            Self::Directory => Self::DIR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Directory => "DIR",
        }
    }
}

/// 磁盘上的 inode 记录（32 字节）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub kind: u32,                            // 文件类型，0 表示空闲
    pub size: u32,                            // 文件大小（字节）
    pub direct: [u32; POINTERS_PER_INODE],    // 直接块指针，0 表示未使用
    pub indirect: u32,                        // 一级间接块，0 表示没有
}

impl Inode {
    pub fn new(inode_type: InodeType, size: u32) -> Self {
        Self {
            kind: inode_type.raw(),
            size,
            ..Self::default()
        }
    }

    /// 全零 inode（删除后写回的内容）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn inode_type(&self) -> Option<InodeType> {
        InodeType::from_raw(self.kind)
    }

    pub fn is_free(&self) -> bool {
        self.inode_type().is_none()
    }

    pub fn has_indirect(&self) -> bool {
        self.indirect != 0
    }

    // 非零直接块指针，按下标顺序
    pub fn direct_blocks(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.direct
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, block)| block != 0)
    }
}

/// inode 在 inode 表中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeLocation {
    pub block: u32,
    pub slot: usize,
}

/// 纯算术定位，不检查 `inum` 是否越界或已分配
pub fn locate_inode(inum: u32) -> InodeLocation {
    InodeLocation {
        block: INODE_TABLE_START_BLOCK_ID + inum / INODES_PER_BLOCK,
        slot: (inum % INODES_PER_BLOCK) as usize,
    }
}

/// 把一个块当作 inode 表块，取出第 `slot` 个 inode
pub fn inode_at(block: &Block, slot: usize) -> Result<Inode> {
    let start = slot * INODE_SIZE;
    Ok(bincode::deserialize(&block[start..start + INODE_SIZE])?)
}

pub fn write_inode_at(block: &mut Block, slot: usize, inode: &Inode) -> Result<()> {
    let start = slot * INODE_SIZE;
    bincode::serialize_into(&mut block[start..start + INODE_SIZE], inode)?;
    Ok(())
}

// 读出 inode 所在的整块，修改后可原样写回
pub fn load_inode<D: BlockDevice>(disk: &D, inum: u32) -> Result<(Inode, Block, InodeLocation)> {
    let location = locate_inode(inum);
    let mut block = ZERO_BLOCK;
    trace!("inode {} -> block {} slot {}", inum, location.block, location.slot);
    disk.read_block(location.block as u64, &mut block)?;
    let inode = inode_at(&block, location.slot)?;
    Ok((inode, block, location))
}

pub fn store_inode<D: BlockDevice>(disk: &D, inum: u32, inode: &Inode) -> Result<()> {
    let (_, mut block, location) = load_inode(disk, inum)?;
    write_inode_at(&mut block, location.slot, inode)?;
    disk.write_block(location.block as u64, &block)?;
    Ok(())
}
