use crate::errors::{AppError, Result, with_path};
use crate::split::Chunk;
use log::warn;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// CSV 表头行，去掉了行尾的换行符
///
/// 按原始字节保存，Latin-1 等非 UTF-8 表头同样可以原样复制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub bytes: Vec<u8>,
    /// 原文件的换行符（`\n` 或 `\r\n`），首行即末行且无换行时为空
    pub terminator: &'static str,
}

impl Header {
    fn terminator_or_default(&self) -> &'static str {
        if self.terminator.is_empty() { "\n" } else { self.terminator }
    }

    /// 插入到分片开头的完整字节
    pub fn line(&self) -> Vec<u8> {
        let mut line = self.bytes.clone();
        line.extend_from_slice(self.terminator_or_default().as_bytes());
        line
    }

    /// 仅用于日志输出
    pub fn display_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// 读取文件首行作为表头
pub fn extract_header(path: &Path) -> Result<Header> {
    let file = File::open(path).map_err(|e| with_path(e, path))?;
    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let read = reader.read_until(b'\n', &mut raw).map_err(|e| with_path(e, path))?;
    if read == 0 {
        return Err(AppError::InvalidFormat(format!("{} 是空文件，没有表头", path.display())));
    }
    Ok(parse_header(&raw))
}

fn parse_header(raw: &[u8]) -> Header {
    let (body, terminator) = if let Some(body) = raw.strip_suffix(b"\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix(b"\n") {
        (body, "\n")
    } else {
        (raw, "")
    };
    Header {
        bytes: body.to_vec(),
        terminator,
    }
}

/// 把表头插入分片的第一行，通过同目录临时文件 + rename 原子替换
///
/// 每个分片只能插入一次：已带表头的分片会被拒绝。
pub fn inject_header(header: &Header, chunk: &mut Chunk) -> Result<()> {
    if chunk.has_header {
        return Err(AppError::HeaderError(format!(
            "{} 已包含表头，拒绝重复插入",
            chunk.path.display()
        )));
    }

    let dir = match chunk.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| with_path(e, dir))?;
    let source = File::open(&chunk.path).map_err(|e| with_path(e, &chunk.path))?;
    write_with_header(header, source, tmp.as_file())
        .map_err(|e| AppError::HeaderError(format!("{}: {}", chunk.path.display(), e)))?;
    if let Ok(meta) = std::fs::metadata(&chunk.path) {
        if let Err(e) = tmp.as_file().set_permissions(meta.permissions()) {
            warn!(
                "chunk={} action=inject_header outcome=permissions_not_copied error=\"{}\"",
                chunk.path.display(),
                e
            );
        }
    }
    tmp.persist(&chunk.path)?;

    chunk.has_header = true;
    chunk.lines += 1;
    Ok(())
}

fn write_with_header(header: &Header, mut source: File, target: &File) -> io::Result<()> {
    let mut writer = BufWriter::new(target);
    writer.write_all(&header.line())?;
    io::copy(&mut source, &mut writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_line_endings() {
        let lf = parse_header(b"id,name\n");
        assert_eq!(lf.bytes, b"id,name");
        assert_eq!(lf.terminator, "\n");

        let crlf = parse_header(b"id,name\r\n");
        assert_eq!(crlf.bytes, b"id,name");
        assert_eq!(crlf.line(), b"id,name\r\n");

        let bare = parse_header(b"id,name");
        assert_eq!(bare.line(), b"id,name\n");
    }

    #[test]
    fn latin1_header_is_kept_as_bytes() {
        let header = parse_header(b"id,Gr\xf6\xdfe\r\n");
        assert_eq!(header.bytes, b"id,Gr\xf6\xdfe");
        assert_eq!(header.display_text(), "id,Gr\u{fffd}\u{fffd}e");
    }
}
