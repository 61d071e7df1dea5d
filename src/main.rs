use clap::Parser;
use csv_auto_split::errors::AppError;
use csv_auto_split::logger::{init_logger, log_error, log_stats};
use csv_auto_split::pipeline::{EXIT_FATAL, exit_code};
use csv_auto_split::{Config, RunSummary, SuffixStyle, run};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "csv-auto-split")]
#[command(about = "Split oversized raw CSV files into header-carrying chunks")]
#[command(version)]
struct Args {
    /// 要扫描的根目录（默认读取 SPLIT_ROOT，否则为 ./test_data）
    root: Option<PathBuf>,

    /// 每个分片的行数
    #[arg(long)]
    chunk_size: Option<usize>,

    /// 行数超过该值才分割
    #[arg(long)]
    threshold: Option<usize>,

    /// 分片后缀长度
    #[arg(long)]
    suffix_length: Option<usize>,

    /// 后缀字符集
    #[arg(long, value_enum)]
    suffix_style: Option<SuffixStyle>,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// 只报告需要分割的文件，不写任何分片
    #[arg(long)]
    dry_run: bool,

    /// 把运行统计以 JSON 写入该文件
    #[arg(long)]
    summary_json: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> Result<Config, AppError> {
    let mut cfg = Config::from_env()?;
    if let Some(root) = &args.root {
        cfg.root = root.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        cfg.chunk_size = chunk_size;
    }
    if let Some(threshold) = args.threshold {
        cfg.threshold = threshold;
    }
    if let Some(len) = args.suffix_length {
        cfg.suffix_length = len;
    }
    if let Some(style) = args.suffix_style {
        cfg.suffix_style = style;
    }
    if let Some(dir) = &args.log_dir {
        cfg.log_dir = dir.clone();
    }
    cfg.dry_run = args.dry_run;
    cfg.validate()?;
    Ok(cfg)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| AppError::FileError(format!("序列化统计失败: {}", e)))?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    if let Err(e) = init_logger(&config.log_dir, args.verbose) {
        eprintln!("无法初始化日志目录 {}: {}", config.log_dir.display(), e);
        return ExitCode::from(EXIT_FATAL);
    }
    log::info!(
        "action=start root={} chunk_size={} threshold={} dry_run={}",
        config.root.display(),
        config.chunk_size,
        config.threshold,
        config.dry_run
    );

    let result = run(&config);
    let code = exit_code(&result);
    match &result {
        Ok(summary) => {
            log_stats(summary);
            if let Some(path) = &args.summary_json {
                if let Err(e) = write_summary(path, summary) {
                    log::error!("action=write_summary outcome=failed path={} error=\"{}\"", path.display(), e);
                    log_error(&e);
                }
            }
            for failure in &summary.failures {
                log::warn!(
                    "file={} action=summary outcome=failed kind={}",
                    failure.path.display(),
                    failure.kind
                );
            }
        }
        Err(e) => {
            log::error!("action=run outcome=fatal kind={} error=\"{}\"", e.kind(), e.message());
            log_error(e);
        }
    }
    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_style_is_parsed_by_clap() {
        let args = Args::try_parse_from(["csv-auto-split", "data", "--suffix-style", "numeric"]).unwrap();
        assert_eq!(args.suffix_style, Some(SuffixStyle::Numeric));

        let args = Args::try_parse_from(["csv-auto-split", "--suffix-style", "alpha"]).unwrap();
        assert_eq!(args.suffix_style, Some(SuffixStyle::Alphabetic));

        assert!(Args::try_parse_from(["csv-auto-split", "--suffix-style", "hex"]).is_err());
    }
}
