//! 文件系统会话：包装块设备与超级块。
//!
//! 每个操作都从原始块重新推导一致性，除超级块外不缓存任何元数据。
//! 会话只支持单线程使用：只读操作借用 `&self`，删除借用 `&mut self`；
//! 需要跨线程共享时由调用方在外层加锁。

use log::{debug, info};

use crate::{
    disk::{BlockDevice, BLOCK_SIZE},
    fs::{
        config::{
            inode_table_blocks, INODE_TABLE_START_BLOCK_ID, MAX_FILE_SIZE, NUM_BLOCKS, NUM_INODES,
        },
        error::{FileSystemError, Result},
        inode_table::{load_inode, Inode},
        super_block::SuperBlock,
    },
};

pub mod bitmap;
pub mod config;
pub mod delete;
pub mod directory;
pub mod dump;
pub mod error;
pub mod indirect;
pub mod inode_table;
pub mod read;
pub mod super_block;

#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D,                 // 底层磁盘抽象层
    super_block: SuperBlock, // 文件系统总体信息
}

impl<D: BlockDevice> FileSystem<D> {
    /// 挂载：读取并校验超级块
    pub fn open(disk: D) -> Result<Self> {
        let super_block = SuperBlock::load(&disk)?;
        if !super_block.is_valid() {
            return Err(FileSystemError::BadMagic(super_block.signature));
        }

        if super_block.num_blocks > NUM_BLOCKS {
            return Err(FileSystemError::Corrupted(format!(
                "{} blocks exceed bitmap capacity of {}",
                super_block.num_blocks, NUM_BLOCKS
            )));
        }
        if super_block.num_inodes > NUM_INODES {
            return Err(FileSystemError::Corrupted(format!(
                "{} inodes exceed bitmap capacity of {}",
                super_block.num_inodes, NUM_INODES
            )));
        }
        if super_block.num_blocks as u64 > disk.num_blocks() {
            return Err(FileSystemError::Corrupted(format!(
                "superblock claims {} blocks but device has {}",
                super_block.num_blocks,
                disk.num_blocks()
            )));
        }
        let table_end = INODE_TABLE_START_BLOCK_ID + inode_table_blocks(super_block.num_inodes);
        if table_end > super_block.num_blocks {
            return Err(FileSystemError::Corrupted(format!(
                "inode table ends at block {} past {} blocks",
                table_end, super_block.num_blocks
            )));
        }
        if super_block.root_inode >= super_block.num_inodes {
            return Err(FileSystemError::Corrupted(format!(
                "root inode {} out of range",
                super_block.root_inode
            )));
        }

        info!(
            "mounted: {} blocks, {} inodes, root inode {}",
            super_block.num_blocks, super_block.num_inodes, super_block.root_inode
        );
        Ok(Self { disk, super_block })
    }

    /// 卸载，交还块设备
    pub fn close(self) -> D {
        debug!("unmounted");
        self.disk
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    /// 按编号读取 inode，只检查范围，不检查位图
    pub fn read_inode(&self, inum: u32) -> Result<Inode> {
        if inum >= self.super_block.num_inodes {
            return Err(FileSystemError::InodeOutOfRange(inum));
        }
        let (inode, _, _) = load_inode(&self.disk, inum)?;
        Ok(inode)
    }

    pub(crate) fn root(&self) -> Result<Inode> {
        self.read_inode(self.super_block.root_inode)
    }

    /// 在根目录中查找文件名，返回第一个匹配项的 inode 编号
    pub fn resolve(&self, name: &str) -> Result<u32> {
        let root = self.root()?;
        match directory::find(&self.disk, &root, name)? {
            Some(location) => {
                debug!("resolved {} -> inode {}", name, location.entry.inum);
                Ok(location.entry.inum)
            }
            None => Err(FileSystemError::NotFound(name.to_string())),
        }
    }

    /// 文件大小（字节），不校验位图
    pub fn get_size(&self, name: &str) -> Result<u32> {
        let inum = self.resolve(name)?;
        let (inode, _, _) = load_inode(&self.disk, inum)?;
        Ok(inode.size)
    }

    /// 根目录中全部有效项，按遍历顺序
    pub fn list_root(&self) -> Result<Vec<(String, u32)>> {
        let root = self.root()?;
        let mut entries = Vec::new();
        directory::scan::<_, (), _>(&self.disk, &root, |location| {
            entries.push((location.entry.name(), location.entry.inum));
            None
        })?;
        Ok(entries)
    }

    /// 按名字读出整个文件
    pub fn read_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        let inum = self.resolve(name)?;
        // size 未经校验，按单个文件能寻址的最大字节数截断
        let size = (self.read_inode(inum)?.size as usize).min(MAX_FILE_SIZE);
        let mut data = vec![0u8; size];
        let copied = self.read(inum, &mut data, 0)?;
        data.truncate(copied);
        Ok(data)
    }

    /// 位于 inode 表之后且不越界的块，只有这些块可以属于文件
    pub fn is_data_block(&self, block: u32) -> bool {
        let data_start =
            INODE_TABLE_START_BLOCK_ID + inode_table_blocks(self.super_block.num_inodes);
        block >= data_start && block < self.super_block.num_blocks
    }
}

/// 块内偏移与块序号
pub(crate) fn split_offset(offset: usize) -> (usize, usize) {
    (offset / BLOCK_SIZE, offset % BLOCK_SIZE)
}
