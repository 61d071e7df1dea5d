use crate::config::Config;
use crate::errors::{AppError, Result};
use crate::header::{self, Header};
use crate::logger::log_error;
use crate::naming::{derive_split_name, list_split_files};
use crate::scan::{line_stats, scan_files};
use crate::split::{self, SplitOutput};
use log::{error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Skipped { lines: usize },
    Split { lines: usize, chunks: Vec<PathBuf> },
    /// dry run 模式下预计产生的分片数
    WouldSplit { lines: usize, chunks: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub split: usize,
    pub chunks_written: usize,
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, path: &Path, err: &AppError) {
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            kind: err.kind(),
            message: err.to_string(),
        });
    }
}

/// 全部文件都已跳过或分割
pub const EXIT_OK: u8 = 0;
/// 根目录不可用、配置错误等导致运行中止
pub const EXIT_FATAL: u8 = 1;
/// 运行完成但有文件处理失败
pub const EXIT_PARTIAL: u8 = 2;

/// 根据运行结果决定进程退出码
pub fn exit_code(result: &Result<RunSummary>) -> u8 {
    match result {
        Ok(summary) if summary.is_clean() => EXIT_OK,
        Ok(_) => EXIT_PARTIAL,
        Err(_) => EXIT_FATAL,
    }
}

/// 行数严格大于阈值时才需要分割
pub fn should_split(lines: usize, config: &Config) -> bool {
    lines > config.threshold
}

/// 处理单个文件：计数、过滤、分割并为后续分片补上表头
pub fn process_file(path: &Path, config: &Config) -> Result<FileOutcome> {
    let stats = line_stats(path)?;
    let lines = stats.lines;
    if !should_split(lines, config) {
        info!(
            "file={} lines={} action=skip outcome=below_threshold threshold={}",
            path.display(),
            lines,
            config.threshold
        );
        return Ok(FileOutcome::Skipped { lines });
    }

    let name = derive_split_name(path);
    if config.dry_run {
        let chunks = stats.records().div_ceil(config.chunk_size);
        info!(
            "file={} lines={} action=split outcome=dry_run chunks={}",
            path.display(),
            lines,
            chunks
        );
        return Ok(FileOutcome::WouldSplit { lines, chunks });
    }

    let header = header::extract_header(path)?;
    let stale = list_split_files(&name.stem)?;
    if !stale.is_empty() {
        warn!(
            "file={} action=split stale_files={} first={}",
            path.display(),
            stale.len(),
            stale[0].display()
        );
    }

    info!("file={} lines={} action=split outcome=started", path.display(), lines);
    let mut output = split::split_file(path, &name, config)?;
    if output.total_lines != stats.records() {
        warn!(
            "file={} counted_lines={} split_lines={} action=split outcome=line_count_changed",
            path.display(),
            lines,
            output.total_lines
        );
    }
    verify_first_chunk(path, &header, &output)?;
    inject_headers(&header, &mut output)?;

    let chunks: Vec<PathBuf> = output.chunks.into_iter().map(|c| c.path).collect();
    info!(
        "file={} lines={} action=split outcome=ok chunks={}",
        path.display(),
        lines,
        chunks.len()
    );
    Ok(FileOutcome::Split { lines, chunks })
}

/// 分割前后首行不一致说明源文件在处理期间被修改
fn verify_first_chunk(path: &Path, header: &Header, output: &SplitOutput) -> Result<()> {
    let Some(first) = output.chunks.first() else {
        return Err(AppError::SplitError(format!("{} 没有生成任何分片", path.display())));
    };
    let observed = header::extract_header(&first.path);
    if !matches!(&observed, Ok(h) if h.bytes == header.bytes) {
        warn!(
            "file={} action=verify_header outcome=mismatch expected=\"{}\"",
            path.display(),
            header.display_text()
        );
        split::remove_chunks(&output.chunks);
        return Err(AppError::SplitError(format!(
            "{} 在分割过程中被修改（表头不一致）",
            path.display()
        )));
    }
    Ok(())
}

/// 为第 2 个及之后的分片各插入一次表头；任一失败则删除全部分片
fn inject_headers(header: &Header, output: &mut SplitOutput) -> Result<()> {
    let mut failed = None;
    for chunk in output.chunks.iter_mut().skip(1) {
        if let Err(err) = header::inject_header(header, chunk) {
            error!(
                "chunk={} action=inject_header outcome=failed kind={} error=\"{}\"",
                chunk.path.display(),
                err.kind(),
                err.message()
            );
            failed.get_or_insert(err);
        }
    }
    match failed {
        Some(err) => {
            split::remove_chunks(&output.chunks);
            Err(err)
        }
        None => Ok(()),
    }
}

/// 扫描根目录并依次处理每个文件，单个文件失败不会中断整个运行
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    let scan = scan_files(&config.root)?;
    info!(
        "root={} files={} scan_errors={} action=scan outcome=ok",
        config.root.display(),
        scan.files.len(),
        scan.errors.len()
    );

    let mut summary = RunSummary::default();
    for (path, err) in &scan.errors {
        error!("path={} action=scan outcome=failed error=\"{}\"", path.display(), err.message());
        log_error(err);
        summary.record_failure(path, err);
    }

    for path in &scan.files {
        match process_file(path, config) {
            Ok(outcome) => {
                summary.processed += 1;
                match outcome {
                    FileOutcome::Skipped { .. } => summary.skipped += 1,
                    FileOutcome::Split { chunks, .. } => {
                        summary.split += 1;
                        summary.chunks_written += chunks.len();
                    }
                    FileOutcome::WouldSplit { .. } => summary.split += 1,
                }
            }
            Err(err) => {
                error!(
                    "file={} action=process outcome=failed kind={} error=\"{}\"",
                    path.display(),
                    err.kind(),
                    err.message()
                );
                log_error(&err);
                summary.record_failure(path, &err);
            }
        }
    }

    info!(
        "action=run outcome=done processed={} skipped={} split={} chunks={} failures={}",
        summary.processed,
        summary.skipped,
        summary.split,
        summary.chunks_written,
        summary.failures.len()
    );
    Ok(summary)
}
