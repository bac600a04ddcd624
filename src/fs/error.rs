use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),      // 底层 I/O 错误
    Codec(bincode::Error),   // 记录编解码失败
    NotFound(String),        // 文件不存在，带文件名
    InodeOutOfRange(u32),    // inode 编号越界
    IsADirectory(String),    // 期望文件，实际是目录
    BadMagic(u32),           // 超级块魔数不匹配
    Corrupted(String),       // 文件系统损坏
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Codec(e)
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::Codec(e) => write!(f, "Malformed on-disk record: {}", e),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::InodeOutOfRange(inum) => write!(f, "Inode number out of range: {}", inum),
            Self::IsADirectory(name) => write!(f, "Expected a file, found a directory: {}", name),
            Self::BadMagic(magic) => write!(f, "Bad superblock signature: {:#010x}", magic),
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
