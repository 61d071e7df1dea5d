use crate::config::Config;
use crate::errors::{AppError, Result, with_path};
use crate::naming::SplitName;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 分割产生的一个分片文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: PathBuf,
    pub lines: usize,
    /// 第一个分片天然带有原文件的表头
    pub has_header: bool,
}

#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub chunks: Vec<Chunk>,
    pub total_lines: usize,
}

/// 按行数把 source 分割为多个分片，返回实际创建的分片列表
///
/// 分片内容逐字节复制，按顺序拼接即可还原原文件。目标路径已存在时不会覆盖；
/// 任何失败都会删除本次已创建的分片。
pub fn split_file(source: &Path, name: &SplitName, config: &Config) -> Result<SplitOutput> {
    let mut created: Vec<Chunk> = Vec::new();
    match write_chunks(source, name, config, &mut created) {
        Ok(total_lines) => Ok(SplitOutput {
            chunks: created,
            total_lines,
        }),
        Err(err) => {
            remove_chunks(&created);
            Err(err)
        }
    }
}

fn write_chunks(
    source: &Path,
    name: &SplitName,
    config: &Config,
    created: &mut Vec<Chunk>,
) -> Result<usize> {
    let file = File::open(source).map_err(|e| with_path(e, source))?;
    let mut reader = BufReader::new(file);

    let mut current_line_count = 0;
    let mut total_lines = 0;
    let mut current_writer: Option<BufWriter<File>> = None;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).map_err(|e| with_path(e, source))?;
        if read == 0 {
            break;
        }
        if current_writer.is_none() || current_line_count >= config.chunk_size {
            if let Some(mut writer) = current_writer.take() {
                finish_chunk(&mut writer, created)?;
            }
            let index = created.len();
            let output_path = name.chunk_path(index, config).ok_or_else(|| {
                AppError::SplitError(format!(
                    "{} 的分片后缀已用尽（最多 {} 个分片）",
                    source.display(),
                    config.max_chunks()
                ))
            })?;
            let writer = create_chunk(&output_path)?;
            debug!("action=create_chunk file={} chunk={}", source.display(), output_path.display());
            created.push(Chunk {
                path: output_path,
                lines: 0,
                has_header: index == 0,
            });
            current_writer = Some(writer);
            current_line_count = 0;
        }
        if let Some(ref mut writer) = current_writer {
            let last = created.len() - 1;
            writer
                .write_all(&line)
                .map_err(|e| with_path(e, &created[last].path))?;
            created[last].lines += 1;
            current_line_count += 1;
            total_lines += 1;
        }
    }

    if let Some(mut writer) = current_writer.take() {
        finish_chunk(&mut writer, created)?;
    }
    Ok(total_lines)
}

fn create_chunk(path: &Path) -> Result<BufWriter<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(BufWriter::new(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(AppError::SplitError(format!(
            "分片 {} 已存在，拒绝覆盖",
            path.display()
        ))),
        Err(e) => Err(with_path(e, path)),
    }
}

fn finish_chunk(writer: &mut BufWriter<File>, created: &[Chunk]) -> Result<()> {
    writer.flush().map_err(|e| match created.last() {
        Some(chunk) => with_path(e, &chunk.path),
        None => AppError::from(e),
    })
}

/// 删除分片文件，忽略已不存在的文件
pub fn remove_chunks(chunks: &[Chunk]) {
    for chunk in chunks {
        if let Err(e) = std::fs::remove_file(&chunk.path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!(
                    "action=cleanup outcome=failed chunk={} error=\"{}\"",
                    chunk.path.display(),
                    e
                );
            }
        }
    }
}
