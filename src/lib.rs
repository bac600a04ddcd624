//! TinyFS：定长块设备上的极简文件系统。
//!
//! 磁盘布局：
//! - 块 0：超级块
//! - 块 1：分配位图（块位图 + inode 位图）
//! - 块 2..：inode 表
//! - 其余：目录块、数据块、间接块，只能通过引用关系区分
//!
//! 支持按名查找、查询大小、按字节范围读取、删除文件以及诊断输出。
//! 格式化、创建文件和写入不在本库范围内。

pub mod disk;
pub mod fs;

pub use disk::{Block, BlockDevice, FileDisk, MemDisk, BLOCK_SIZE};
pub use fs::{
    bitmap::Bitmap,
    config::*,
    directory::DirEntry,
    dump::{inspect, DumpReport, InodeReport},
    error::{FileSystemError, Result},
    indirect::IndirectBlock,
    inode_table::{locate_inode, Inode, InodeLocation, InodeType},
    super_block::SuperBlock,
    FileSystem,
};
