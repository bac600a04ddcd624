use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, ZERO_BLOCK},
    fs::{
        config::{DIR_ENTRY_SIZE, FILE_NAME_LEN, NUM_DENTRIES_PER_BLOCK},
        error::Result,
        inode_table::Inode,
    },
};

// 一个目录项（32 字节）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub valid: u32,
    pub fname: [u8; FILE_NAME_LEN], // 不足补 0，满 24 字节时没有结尾 0
    pub inum: u32,
}

impl DirEntry {
    /// 名字超过 24 字节时被截断
    pub fn new(name: &str, inum: u32) -> Self {
        let mut fname = [0u8; FILE_NAME_LEN];
        let len = name.len().min(FILE_NAME_LEN);
        fname[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            valid: 1,
            fname,
            inum,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    // 第一个 0 之前的字节
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .fname
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILE_NAME_LEN);
        &self.fname[..len]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// 精确匹配；超过 24 字节的名字永远不会匹配
    pub fn name_matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }
}

pub fn dentry_at(block: &Block, slot: usize) -> Result<DirEntry> {
    let start = slot * DIR_ENTRY_SIZE;
    Ok(bincode::deserialize(&block[start..start + DIR_ENTRY_SIZE])?)
}

pub fn write_dentry_at(block: &mut Block, slot: usize, entry: &DirEntry) -> Result<()> {
    let start = slot * DIR_ENTRY_SIZE;
    bincode::serialize_into(&mut block[start..start + DIR_ENTRY_SIZE], entry)?;
    Ok(())
}

/// 目录项在磁盘上的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryLocation {
    pub block: u32,
    pub slot: usize,
    pub entry: DirEntry,
}

/// 按直接指针顺序、再按块内槽位顺序遍历目录中的有效项
///
/// 回调返回 `Some` 时立即停止遍历。目录从不使用间接块。
pub fn scan<D, T, F>(disk: &D, dir: &Inode, mut visit: F) -> Result<Option<T>>
where
    D: BlockDevice,
    F: FnMut(DirEntryLocation) -> Option<T>,
{
    let mut block = ZERO_BLOCK;
    for (_, block_id) in dir.direct_blocks() {
        trace!("scanning directory block {}", block_id);
        disk.read_block(block_id as u64, &mut block)?;
        for slot in 0..NUM_DENTRIES_PER_BLOCK {
            let entry = dentry_at(&block, slot)?;
            if !entry.is_valid() {
                continue;
            }
            let location = DirEntryLocation {
                block: block_id,
                slot,
                entry,
            };
            if let Some(found) = visit(location) {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

// 第一个同名的有效项
pub fn find<D: BlockDevice>(disk: &D, dir: &Inode, name: &str) -> Result<Option<DirEntryLocation>> {
    scan(disk, dir, |location| location.entry.name_matches(name).then_some(location))
}

/// 使目录项失效并写回所在块
pub fn invalidate<D: BlockDevice>(disk: &D, location: &DirEntryLocation) -> Result<()> {
    let mut block = ZERO_BLOCK;
    disk.read_block(location.block as u64, &mut block)?;
    let mut entry = dentry_at(&block, location.slot)?;
    entry.valid = 0;
    write_dentry_at(&mut block, location.slot, &entry)?;
    disk.write_block(location.block as u64, &block)?;
    Ok(())
}
