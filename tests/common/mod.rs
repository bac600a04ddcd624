//! 测试公共工具：直接在内存盘上摆放磁盘记录，构造测试镜像。

#![allow(dead_code)]

use std::{
    io::{Error, ErrorKind, Result},
    sync::Mutex,
};

use tiny_fs::{
    fs::{
        directory::write_dentry_at,
        inode_table::store_inode,
    },
    Bitmap, Block, BlockDevice, DirEntry, IndirectBlock, Inode, InodeType, MemDisk, SuperBlock,
    BLOCK_SIZE, NUM_DENTRIES_PER_BLOCK, POINTERS_PER_INODE, ROOT_INODE,
};

pub const ROOT_DIR_BLOCK: u32 = 3;

/// 可预测的测试数据
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i * 7 + seed as usize) % 251) as u8)
        .collect()
}

pub struct Image {
    pub disk: MemDisk,
    pub bitmap: Bitmap,
    root: Inode,
    next_slot: usize,
}

impl Image {
    /// 1024 块、128 个 inode；根目录为 inode 1，direct[0] = 3
    pub fn new() -> Self {
        Self::with_counts(1024, 128)
    }

    pub fn with_counts(num_blocks: u32, num_inodes: u32) -> Self {
        let disk = MemDisk::new(num_blocks as u64);
        SuperBlock::new(num_blocks, num_inodes).sync(&disk).unwrap();

        let mut bitmap = Bitmap::new();
        for block in 0..=ROOT_DIR_BLOCK {
            bitmap.mark_block_used(block);
        }
        bitmap.mark_inode_used(ROOT_INODE);

        let mut root = Inode::new(InodeType::Directory, BLOCK_SIZE as u32);
        root.direct[0] = ROOT_DIR_BLOCK;

        let mut image = Self {
            disk,
            bitmap,
            root,
            next_slot: 0,
        };
        image.put_inode(ROOT_INODE, &root);
        image
    }

    pub fn write_block(&self, block_id: u32, bytes: &[u8]) {
        let mut block = [0u8; BLOCK_SIZE];
        block[..bytes.len()].copy_from_slice(bytes);
        self.disk.write_block(block_id as u64, &block).unwrap();
    }

    pub fn read_block(&self, block_id: u32) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        self.disk.read_block(block_id as u64, &mut block).unwrap();
        block
    }

    pub fn put_inode(&mut self, inum: u32, inode: &Inode) {
        store_inode(&self.disk, inum, inode).unwrap();
    }

    /// 给根目录追加一个目录块
    pub fn add_root_block(&mut self, block_id: u32) {
        let index = self
            .root
            .direct
            .iter()
            .position(|&b| b == 0)
            .expect("root has a free direct pointer");
        self.root.direct[index] = block_id;
        self.bitmap.mark_block_used(block_id);
        self.write_block(block_id, &[]);
        let root = self.root;
        self.put_inode(ROOT_INODE, &root);
    }

    /// 在指定目录块的指定槽位写入目录项
    pub fn put_entry_at(&self, block_id: u32, slot: usize, entry: &DirEntry) {
        let mut block = self.read_block(block_id);
        write_dentry_at(&mut block, slot, entry).unwrap();
        self.disk.write_block(block_id as u64, &block).unwrap();
    }

    /// 按顺序把目录项放进根目录块
    pub fn add_entry(&mut self, entry: DirEntry) {
        let block_index = self.next_slot / NUM_DENTRIES_PER_BLOCK;
        let slot = self.next_slot % NUM_DENTRIES_PER_BLOCK;
        let block_id = self.root.direct[block_index];
        assert_ne!(block_id, 0, "root directory block {} missing", block_index);
        self.put_entry_at(block_id, slot, &entry);
        self.next_slot += 1;
    }

    /// 写入一个普通文件：前 5 个数据块放直接指针，其余放进间接块
    pub fn add_file(
        &mut self,
        name: &str,
        inum: u32,
        blocks: &[u32],
        indirect: Option<u32>,
        data: &[u8],
    ) -> Inode {
        assert!(data.len() <= blocks.len() * BLOCK_SIZE);
        let mut inode = Inode::new(InodeType::Regular, data.len() as u32);

        for (i, &block_id) in blocks.iter().enumerate() {
            let start = (i * BLOCK_SIZE).min(data.len());
            let end = ((i + 1) * BLOCK_SIZE).min(data.len());
            self.write_block(block_id, &data[start..end]);
            self.bitmap.mark_block_used(block_id);
        }

        let split = blocks.len().min(POINTERS_PER_INODE);
        inode.direct[..split].copy_from_slice(&blocks[..split]);
        if blocks.len() > POINTERS_PER_INODE {
            let indirect_id = indirect.expect("file needs an indirect block");
            let mut pointers = IndirectBlock::default();
            let rest = &blocks[POINTERS_PER_INODE..];
            pointers.pointers_mut()[..rest.len()].copy_from_slice(rest);
            self.disk
                .write_block(indirect_id as u64, &pointers.encode())
                .unwrap();
            self.bitmap.mark_block_used(indirect_id);
            inode.indirect = indirect_id;
        }

        self.put_inode(inum, &inode);
        self.bitmap.mark_inode_used(inum);
        self.add_entry(DirEntry::new(name, inum));
        inode
    }

    /// 写回位图，返回完整镜像
    pub fn finish(self) -> MemDisk {
        self.bitmap.sync(&self.disk).unwrap();
        self.disk
    }
}

/// 典型镜像：hello.txt -> inode 5，数据块 10、11，大小 4100
pub fn hello_image() -> (MemDisk, Vec<u8>) {
    let mut image = Image::new();
    let data = pattern(4100, 1);
    image.add_file("hello.txt", 5, &[10, 11], None, &data);
    (image.finish(), data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u64),
    Write(u64),
}

/// 记录每次块访问的包装设备
pub struct RecordingDisk<D> {
    inner: D,
    log: Mutex<Vec<Access>>,
    fail_writes: bool,
}

impl<D: BlockDevice> RecordingDisk<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            log: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    /// 所有写操作都返回 I/O 错误
    pub fn read_only(inner: D) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(inner)
        }
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.log.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<u64> {
        self.accesses()
            .into_iter()
            .filter_map(|a| match a {
                Access::Write(b) => Some(b),
                Access::Read(_) => None,
            })
            .collect()
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: BlockDevice> BlockDevice for RecordingDisk<D> {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        self.log.lock().unwrap().push(Access::Read(block_id));
        self.inner.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        self.log.lock().unwrap().push(Access::Write(block_id));
        if self.fail_writes {
            return Err(Error::new(ErrorKind::PermissionDenied, "write-protected"));
        }
        self.inner.write_block(block_id, buf)
    }

    fn num_blocks(&self) -> u64 {
        self.inner.num_blocks()
    }
}
