use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use log::info;

use crate::disk::{
    block_device::{out_of_range, poisoned, BlockDevice},
    types::{Block, BLOCK_SIZE},
};

/// 以普通文件作为后端的虚拟磁盘（磁盘镜像）
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    num_blocks: u64,
}

impl FileDisk {
    /// 打开已存在的磁盘镜像，镜像长度必须是块大小的整数倍
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("image size {} is not a multiple of {}", len, BLOCK_SIZE),
            ));
        }

        let num_blocks = len / BLOCK_SIZE as u64;
        info!("opened disk image {} ({} blocks)", path.as_ref().display(), num_blocks);

        Ok(Self {
            file: Mutex::new(file),
            num_blocks,
        })
    }

    /// 创建（或扩展）一个全零镜像，不做任何格式化
    pub fn create<P: AsRef<Path>>(path: P, num_blocks: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let disk_size = num_blocks * BLOCK_SIZE as u64;
        if file.metadata()?.len() < disk_size {
            info!("allocating {} bytes for {}", disk_size, path.as_ref().display());
            file.set_len(disk_size)?;
        }

        Ok(Self {
            file: Mutex::new(file),
            num_blocks,
        })
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id, self.num_blocks));
        }
        let mut file = self.file.lock().map_err(|_| poisoned())?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(out_of_range(block_id, self.num_blocks));
        }
        let mut file = self.file.lock().map_err(|_| poisoned())?;
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn num_blocks(&self) -> u64 {
        self.num_blocks
    }
}
