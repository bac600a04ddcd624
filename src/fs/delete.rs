use log::{debug, trace, warn};

use crate::{
    disk::BlockDevice,
    fs::{
        bitmap::Bitmap,
        directory,
        error::{FileSystemError, Result},
        indirect::IndirectBlock,
        inode_table::{load_inode, write_inode_at, Inode, InodeType},
        FileSystem,
    },
};

impl<D: BlockDevice> FileSystem<D> {
    /// 删除根目录中的文件，回收其全部数据块、间接块与 inode
    ///
    /// 先确认目录项存在且指向合法的普通文件，再修改任何块；
    /// 失败时磁盘内容保持不变。写回顺序：目录项、inode、位图。
    ///
    /// 指向元数据区（超级块、位图、inode 表）、根目录块或越界的指针
    /// 不会被释放，只记录警告，对应的位保持占用。
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let root = self.root()?;
        let location = directory::find(&self.disk, &root, name)?
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))?;
        let inum = location.entry.inum;

        if inum >= self.super_block.num_inodes {
            return Err(FileSystemError::Corrupted(format!(
                "directory entry {} points to inode {} out of range",
                name, inum
            )));
        }
        if inum == self.super_block.root_inode {
            return Err(FileSystemError::IsADirectory(name.to_string()));
        }

        let mut bitmap = Bitmap::load(&self.disk)?;
        let (inode, mut inode_block, inode_location) = load_inode(&self.disk, inum)?;
        if inode.inode_type() == Some(InodeType::Directory) {
            return Err(FileSystemError::IsADirectory(name.to_string()));
        }
        let indirect = if inode.has_indirect() && self.is_data_block(inode.indirect) {
            Some(IndirectBlock::load(&self.disk, inode.indirect)?)
        } else {
            None
        };

        debug!("[inode #{}] deleting {}", inum, name);

        for (_, block_id) in inode.direct_blocks() {
            self.release_block(&mut bitmap, &root, inum, block_id);
        }
        if let Some(indirect) = &indirect {
            for (_, block_id) in indirect.non_zero() {
                self.release_block(&mut bitmap, &root, inum, block_id);
            }
        }
        if inode.has_indirect() {
            self.release_block(&mut bitmap, &root, inum, inode.indirect);
        }
        bitmap.mark_inode_free(inum);

        directory::invalidate(&self.disk, &location)?;
        trace!("invalidated entry at block {} slot {}", location.block, location.slot);

        write_inode_at(&mut inode_block, inode_location.slot, &Inode::empty())?;
        self.disk
            .write_block(inode_location.block as u64, &inode_block)?;

        bitmap.sync(&self.disk)?;
        Ok(())
    }

    fn release_block(&self, bitmap: &mut Bitmap, root: &Inode, inum: u32, block_id: u32) {
        if !self.is_data_block(block_id) {
            warn!("[inode #{}] skipping non-data block {}", inum, block_id);
        } else if root.direct.contains(&block_id) {
            warn!("[inode #{}] skipping root directory block {}", inum, block_id);
        } else {
            bitmap.mark_block_free(block_id);
        }
    }
}
