use crate::config::{Config, SuffixStyle};
use crate::errors::{Result, with_path};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// 分片文件名前缀末尾追加的标记
pub const STEM_MARKER: &str = "_";

/// 分片命名：`<stem><suffix><extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    pub stem: OsString,
    /// 包含前导的 `.`，没有扩展名时为空
    pub extension: OsString,
}

/// 按最后一个 `.` 拆出扩展名，并在去掉扩展名的路径末尾追加 `_`
pub fn derive_split_name(path: &Path) -> SplitName {
    let extension = match path.extension() {
        Some(ext) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            dotted
        }
        None => OsString::new(),
    };
    let mut stem = path.with_extension("").into_os_string();
    stem.push(STEM_MARKER);
    SplitName { stem, extension }
}

/// 第 index 个分片的后缀；超出后缀空间时返回 None
///
/// 定长后缀保证按字典序排序即为分片顺序。
pub fn suffix_for(index: usize, length: usize, style: SuffixStyle) -> Option<String> {
    let radix = style.radix();
    let mut rest = index;
    let mut digits = vec![style.digit(0); length];
    for slot in digits.iter_mut().rev() {
        *slot = style.digit(rest % radix);
        rest /= radix;
    }
    if rest > 0 {
        return None;
    }
    Some(digits.into_iter().collect())
}

impl SplitName {
    pub fn chunk_path(&self, index: usize, config: &Config) -> Option<PathBuf> {
        let suffix = suffix_for(index, config.suffix_length, config.suffix_style)?;
        let mut name = self.stem.clone();
        name.push(suffix);
        name.push(&self.extension);
        Some(PathBuf::from(name))
    }
}

/// 列出与 stem 同目录、文件名以 stem 开头的已有文件，按字典序排序
pub fn list_split_files(stem: &OsStr) -> Result<Vec<PathBuf>> {
    let stem_path = Path::new(stem);
    let dir = match stem_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = stem_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut matches = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| with_path(e, &dir))? {
        let entry = entry.map_err(|e| with_path(e, &dir))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}
