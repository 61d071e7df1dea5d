use crate::errors::{AppError, Result, with_path};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 目录扫描结果：可读的普通文件，以及扫描中遇到的错误
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, AppError)>,
}

/// 递归列出 root 下的所有普通文件
///
/// root 不存在或不是目录时直接返回错误；子目录读取失败会记录到
/// `ScanResult::errors` 中，扫描继续。
pub fn scan_files(root: &Path) -> Result<ScanResult> {
    let meta = std::fs::metadata(root).map_err(|e| with_path(e, root))?;
    if !meta.is_dir() {
        return Err(AppError::NotFound(format!("{} 不是目录", root.display())));
    }

    let mut result = ScanResult::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                result.files.push(entry.into_path());
            }
            // 指向文件的符号链接计入结果；指向目录的链接不跟随
            Ok(entry) if entry.path_is_symlink() => match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => result.files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = entry.into_path();
                    let err = with_path(e, &path);
                    result.errors.push((path, err));
                }
            },
            Ok(_) => {}
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                result.errors.push((path, AppError::from(err)));
            }
        }
    }
    Ok(result)
}

/// 行数统计结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStats {
    /// 换行符个数，与 `wc -l` 的语义一致
    pub lines: usize,
    /// 最后一行没有换行符
    pub unterminated_tail: bool,
}

impl LineStats {
    /// 分割时实际会复制的行数
    pub fn records(&self) -> usize {
        self.lines + usize::from(self.unterminated_tail)
    }
}

/// 统计换行符个数，与 `wc -l` 的语义一致
pub fn count_lines(path: &Path) -> Result<usize> {
    Ok(line_stats(path)?.lines)
}

pub fn line_stats(path: &Path) -> Result<LineStats> {
    let meta = std::fs::metadata(path).map_err(|e| with_path(e, path))?;
    if !meta.is_file() {
        return Err(AppError::InvalidFormat(format!("{} 不是普通文件", path.display())));
    }

    let file = File::open(path).map_err(|e| with_path(e, path))?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut count = 0;
    let mut last = None;
    loop {
        let buf = reader.fill_buf().map_err(|e| with_path(e, path))?;
        if buf.is_empty() {
            break;
        }
        if buf.contains(&0) {
            return Err(AppError::InvalidFormat(format!(
                "{} 包含 NUL 字节，不是文本文件",
                path.display()
            )));
        }
        count += buf.iter().filter(|&&b| b == b'\n').count();
        last = buf.last().copied();
        let len = buf.len();
        reader.consume(len);
    }
    Ok(LineStats {
        lines: count,
        unterminated_tail: matches!(last, Some(b) if b != b'\n'),
    })
}
