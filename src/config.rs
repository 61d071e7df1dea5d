use crate::errors::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ROOT: &str = "./test_data";
pub const DEFAULT_CHUNK_SIZE: usize = 25_000;
pub const DEFAULT_THRESHOLD: usize = 104_000;
pub const DEFAULT_SUFFIX_LENGTH: usize = 1;
pub const DEFAULT_LOG_DIR: &str = "logs";

/// 分片文件后缀的字符集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SuffixStyle {
    /// a..z，与 `split` 默认行为一致
    #[default]
    #[value(alias = "alpha")]
    Alphabetic,
    /// 0..9
    #[value(alias = "num")]
    Numeric,
}

impl SuffixStyle {
    pub fn radix(self) -> usize {
        match self {
            SuffixStyle::Alphabetic => 26,
            SuffixStyle::Numeric => 10,
        }
    }

    pub fn digit(self, value: usize) -> char {
        match self {
            SuffixStyle::Alphabetic => (b'a' + value as u8) as char,
            SuffixStyle::Numeric => (b'0' + value as u8) as char,
        }
    }
}

impl FromStr for SuffixStyle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alphabetic" | "alpha" => Ok(SuffixStyle::Alphabetic),
            "numeric" | "num" => Ok(SuffixStyle::Numeric),
            other => Err(AppError::ConfigError(format!("未知的后缀类型: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    /// 每个分片最多包含的行数
    pub chunk_size: usize,
    /// 行数严格大于该值的文件才会被分割
    pub threshold: usize,
    pub suffix_length: usize,
    pub suffix_style: SuffixStyle,
    pub log_dir: PathBuf,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            threshold: DEFAULT_THRESHOLD,
            suffix_length: DEFAULT_SUFFIX_LENGTH,
            suffix_style: SuffixStyle::Alphabetic,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            dry_run: false,
        }
    }
}

impl Config {
    /// 从环境变量（以及可选的 .env 文件）读取配置，未设置的项保留默认值
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut cfg = Config::default();
        if let Ok(root) = env::var("SPLIT_ROOT") {
            cfg.root = PathBuf::from(root);
        }
        if let Ok(value) = env::var("SPLIT_CHUNK_SIZE") {
            cfg.chunk_size = value.trim().parse()?;
        }
        if let Ok(value) = env::var("SPLIT_THRESHOLD") {
            cfg.threshold = value.trim().parse()?;
        }
        if let Ok(value) = env::var("SPLIT_SUFFIX_LENGTH") {
            cfg.suffix_length = value.trim().parse()?;
        }
        if let Ok(value) = env::var("SPLIT_SUFFIX_STYLE") {
            cfg.suffix_style = value.parse()?;
        }
        if let Ok(dir) = env::var("SPLIT_LOG_DIR") {
            cfg.log_dir = PathBuf::from(dir);
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AppError::ConfigError("chunk_size 必须大于 0".to_string()));
        }
        if self.suffix_length == 0 {
            return Err(AppError::ConfigError("suffix_length 必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 后缀空间能容纳的分片数量上限
    pub fn max_chunks(&self) -> usize {
        let radix = self.suffix_style.radix();
        (0..self.suffix_length).fold(1usize, |acc, _| acc.saturating_mul(radix))
    }
}
