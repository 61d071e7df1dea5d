use std::fmt;
use std::io;

#[derive(Debug)]
pub enum AppError {
    ConfigError(String),
    FileError(String),
    NotFound(String),
    InvalidFormat(String),
    SplitError(String),
    HeaderError(String),
}

impl AppError {
    /// 结构化日志里使用的错误类型名，同时决定错误日志文件名
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "config",
            AppError::FileError(_) => "file",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidFormat(_) => "invalid_format",
            AppError::SplitError(_) => "split",
            AppError::HeaderError(_) => "header",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::ConfigError(msg)
            | AppError::FileError(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidFormat(msg)
            | AppError::SplitError(msg)
            | AppError::HeaderError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ConfigError(msg) => write!(f, "配置错误: {}", msg),
            AppError::FileError(msg) => write!(f, "文件错误: {}", msg),
            AppError::NotFound(msg) => write!(f, "路径不存在: {}", msg),
            AppError::InvalidFormat(msg) => write!(f, "格式错误: {}", msg),
            AppError::SplitError(msg) => write!(f, "分割错误: {}", msg),
            AppError::HeaderError(msg) => write!(f, "表头错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::ConfigError(format!("解析错误: {}", err))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::FileError(err.to_string()),
        }
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        AppError::FileError(format!("{}: {}", path, err))
    }
}

impl From<tempfile::PersistError> for AppError {
    fn from(err: tempfile::PersistError) -> Self {
        AppError::HeaderError(format!("替换文件失败: {}", err.error))
    }
}

/// 为 io 错误附加路径信息，保留 NotFound 分类
pub(crate) fn with_path(err: io::Error, path: &std::path::Path) -> AppError {
    match err.kind() {
        io::ErrorKind::NotFound => AppError::NotFound(format!("{}: {}", path.display(), err)),
        _ => AppError::FileError(format!("{}: {}", path.display(), err)),
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
