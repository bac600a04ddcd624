//! 只读诊断：遍历超级块、位图和 inode 表，供人工检查。

use std::fmt;

use log::debug;

use crate::{
    disk::{BlockDevice, ZERO_BLOCK},
    fs::{
        bitmap::Bitmap,
        config::{inode_table_blocks, INODES_PER_BLOCK, INODE_TABLE_START_BLOCK_ID, NUM_BLOCKS, NUM_INODES},
        error::Result,
        indirect::IndirectBlock,
        inode_table::{inode_at, InodeType},
        super_block::SuperBlock,
        FileSystem,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inum: u32,
    pub inode_type: InodeType,
    pub size: u32,
    pub direct: Vec<(usize, u32)>,
    pub indirect: Option<u32>,
    pub indirect_entries: Vec<(usize, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub super_block: SuperBlock,
    pub blocks_in_use: u32,
    pub inodes_in_use: u32,
    pub inodes: Vec<InodeReport>,
}

/// 检查任意设备，超级块无效时同样可用；从不写盘
pub fn inspect<D: BlockDevice>(disk: &D) -> Result<DumpReport> {
    let super_block = SuperBlock::load(disk)?;
    let bitmap = Bitmap::load(disk)?;

    // 超级块可能是垃圾数据，按位图容量与设备大小截断
    let device_blocks = disk.num_blocks().min(u64::from(u32::MAX)) as u32;
    let num_blocks = super_block.num_blocks.min(NUM_BLOCKS).min(device_blocks);
    let num_inodes = super_block.num_inodes.min(NUM_INODES);
    let table_blocks = inode_table_blocks(num_inodes);

    let mut inodes = Vec::new();
    let mut block = ZERO_BLOCK;
    for table_index in 0..table_blocks {
        let block_id = INODE_TABLE_START_BLOCK_ID + table_index;
        if block_id >= device_blocks {
            break;
        }
        disk.read_block(block_id as u64, &mut block)?;

        for slot in 0..INODES_PER_BLOCK {
            let inum = table_index * INODES_PER_BLOCK + slot;
            if inum >= num_inodes {
                break;
            }
            let inode = inode_at(&block, slot as usize)?;
            let Some(inode_type) = inode.inode_type() else {
                continue;
            };

            // 只有 indirect != 0 且在范围内时才读取间接块
            let mut indirect_entries = Vec::new();
            if inode.has_indirect() && inode.indirect < num_blocks {
                let indirect = IndirectBlock::load(disk, inode.indirect)?;
                indirect_entries = indirect
                    .non_zero()
                    .filter(|&(_, b)| b < num_blocks && bitmap.is_block_in_use(b))
                    .collect();
            }

            inodes.push(InodeReport {
                inum,
                inode_type,
                size: inode.size,
                direct: inode.direct_blocks().collect(),
                indirect: inode.has_indirect().then_some(inode.indirect),
                indirect_entries,
            });
        }
    }

    let report = DumpReport {
        super_block,
        blocks_in_use: bitmap.blocks_in_use(),
        inodes_in_use: bitmap.inodes_in_use(),
        inodes,
    };
    debug!(
        "dump: {} live inodes, {} blocks in use",
        report.inodes.len(),
        report.blocks_in_use
    );
    Ok(report)
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn dump(&self) -> Result<DumpReport> {
        inspect(&self.disk)
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sb = &self.super_block;
        writeln!(f, "superblock:")?;
        if sb.is_valid() {
            writeln!(f, "      signature is valid")?;
        } else {
            writeln!(f, "      signature is invalid")?;
        }
        writeln!(f, "      {} blocks total", sb.num_blocks)?;
        writeln!(f, "      {} inodes total", sb.num_inodes)?;
        writeln!(f, "      root inode = {}", sb.root_inode)?;
        writeln!(f, "      {} blocks in use", self.blocks_in_use)?;
        writeln!(f, "      {} inodes in use", self.inodes_in_use)?;

        for inode in &self.inodes {
            writeln!(f, "inode {}:", inode.inum)?;
            writeln!(f, "      type = {}", inode.inode_type.name())?;
            writeln!(f, "      size = {}", inode.size)?;
            for (k, block) in &inode.direct {
                writeln!(f, "      direct[{}] = {}", k, block)?;
            }
            if let Some(indirect) = inode.indirect {
                writeln!(f, "      indirect = {}", indirect)?;
                for (k, block) in &inode.indirect_entries {
                    writeln!(f, "        indirect[{}] = {}", k, block)?;
                }
            }
        }
        Ok(())
    }
}
