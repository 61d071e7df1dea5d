//! 遍历原始 CSV 数据目录，把行数超过阈值的文件按固定行数分割，
//! 并把原文件的表头补到除第一个之外的每个分片中。

pub mod config;
pub mod errors;
pub mod header;
pub mod logger;
pub mod naming;
pub mod pipeline;
pub mod scan;
pub mod split;

pub use config::{Config, SuffixStyle};
pub use errors::AppError;
pub use pipeline::{FileOutcome, RunSummary, process_file, run};
