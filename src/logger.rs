use crate::errors::AppError;
use crate::pipeline::RunSummary;
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 同时写 stderr 与 `<log_dir>/run.log` 的日志实现
struct RunLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

static LOGGER: OnceCell<RunLogger> = OnceCell::new();
static LOG_DIR: OnceCell<PathBuf> = OnceCell::new();

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record.level(), &record.args().to_string());
        eprint!("{}", line);
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn format_record(level: Level, message: &str) -> String {
    let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    format!("time=\"{}\" level={} {}\n", time, level, message)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// 创建日志目录并安装全局 logger，重复调用只生效一次
pub fn init_logger(log_dir: &Path, verbose: bool) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let logger = LOGGER.get_or_try_init(|| {
        let file = open_append(&log_dir.join("run.log"))?;
        Ok::<_, io::Error>(RunLogger {
            level,
            file: Mutex::new(file),
        })
    })?;
    let _ = LOG_DIR.set(log_dir.to_path_buf());

    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
    Ok(())
}

fn log_dir() -> Option<&'static PathBuf> {
    LOG_DIR.get()
}

/// 按错误类型追加到 `<kind>_errors.log`
pub fn log_error(err: &AppError) {
    let Some(dir) = log_dir() else {
        return;
    };
    let path = dir.join(format!("{}_errors.log", err.kind()));
    let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let entry = format!(
        "错误类型: {} | 详情: {} | 时间: {}\n",
        err.kind(),
        err.message(),
        time
    );
    match open_append(&path) {
        Ok(mut file) => {
            if let Err(e) = file.write_all(entry.as_bytes()) {
                log::warn!("action=log_error outcome=failed path={} error=\"{}\"", path.display(), e);
            }
        }
        Err(e) => {
            log::warn!("action=log_error outcome=failed path={} error=\"{}\"", path.display(), e);
        }
    }
}

pub fn log_stats(summary: &RunSummary) {
    let Some(dir) = log_dir() else {
        return;
    };
    let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let entry = format!(
        "[{}] 运行统计 - 处理文件: {}, 跳过: {}, 分割: {}, 生成分片: {}, 失败: {}\n",
        time,
        summary.processed,
        summary.skipped,
        summary.split,
        summary.chunks_written,
        summary.failures.len()
    );
    if let Ok(mut file) = open_append(&dir.join("stats.log")) {
        let _ = file.write_all(entry.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_key_value_line() {
        let line = format_record(Level::Info, "file=a.csv lines=3 action=skip");
        assert!(line.starts_with("time=\""));
        assert!(line.contains("level=INFO file=a.csv lines=3 action=skip"));
        assert!(line.ends_with('\n'));
    }
}
