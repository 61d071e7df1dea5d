use csv_auto_split::config::{Config, SuffixStyle};
use csv_auto_split::errors::AppError;
use csv_auto_split::header::{extract_header, inject_header};
use csv_auto_split::naming::{derive_split_name, list_split_files};
use csv_auto_split::scan::{count_lines, line_stats, scan_files};
use csv_auto_split::split::split_file;
use std::fs;
use tempfile::tempdir;

#[test]
fn count_lines_matches_newline_count() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.csv");

    fs::write(&path, "h\n1\n2\n").unwrap();
    assert_eq!(count_lines(&path).unwrap(), 3);

    // 末行没有换行符时与 wc -l 一致，不计入
    fs::write(&path, "h\n1\n2").unwrap();
    assert_eq!(count_lines(&path).unwrap(), 2);

    fs::write(&path, "").unwrap();
    assert_eq!(count_lines(&path).unwrap(), 0);
}

#[test]
fn line_stats_reports_unterminated_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.csv");

    fs::write(&path, "h\n1\n2").unwrap();
    let stats = line_stats(&path).unwrap();
    assert_eq!(stats.lines, 2);
    assert!(stats.unterminated_tail);
    assert_eq!(stats.records(), 3);

    fs::write(&path, "h\n1\n").unwrap();
    assert_eq!(line_stats(&path).unwrap().records(), 2);
}

#[test]
fn count_lines_error_kinds() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        count_lines(&dir.path().join("missing.csv")),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(count_lines(dir.path()), Err(AppError::InvalidFormat(_))));

    let binary = dir.path().join("blob.bin");
    fs::write(&binary, [0x50u8, 0x4b, 0x00, 0x03, b'\n']).unwrap();
    assert!(matches!(count_lines(&binary), Err(AppError::InvalidFormat(_))));
}

#[test]
fn scan_lists_nested_files_only() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("x/y")).unwrap();
    fs::write(dir.path().join("b.csv"), "h\n").unwrap();
    fs::write(dir.path().join("x/a.csv"), "h\n").unwrap();
    fs::write(dir.path().join("x/y/c.txt"), "h\n").unwrap();

    let result = scan_files(dir.path()).unwrap();
    assert!(result.errors.is_empty());
    assert_eq!(
        result.files,
        vec![
            dir.path().join("b.csv"),
            dir.path().join("x/a.csv"),
            dir.path().join("x/y/c.txt"),
        ]
    );

    let file_root = dir.path().join("b.csv");
    assert!(matches!(scan_files(&file_root), Err(AppError::NotFound(_))));
}

#[test]
fn splitter_returns_created_chunks_in_order() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("rows");
    fs::write(&source, "h\n1\n2\n3\n4\n5\n6").unwrap();
    let cfg = Config {
        chunk_size: 3,
        suffix_style: SuffixStyle::Numeric,
        suffix_length: 2,
        ..Default::default()
    };

    let name = derive_split_name(&source);
    let output = split_file(&source, &name, &cfg).unwrap();
    assert_eq!(output.total_lines, 7);

    let paths: Vec<_> = output.chunks.iter().map(|c| c.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            dir.path().join("rows_00"),
            dir.path().join("rows_01"),
            dir.path().join("rows_02"),
        ]
    );
    let lines: Vec<_> = output.chunks.iter().map(|c| c.lines).collect();
    assert_eq!(lines, vec![3, 3, 1]);
    assert!(output.chunks[0].has_header);
    assert!(!output.chunks[1].has_header);

    assert_eq!(fs::read_to_string(&paths[2]).unwrap(), "6");
    assert_eq!(list_split_files(&name.stem).unwrap(), paths);
}

#[test]
fn header_is_injected_exactly_once() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("data.csv");
    fs::write(&source, "id,v\n1,a\n2,b\n3,c\n").unwrap();
    let cfg = Config {
        chunk_size: 2,
        ..Default::default()
    };

    let header = extract_header(&source).unwrap();
    assert_eq!(header.bytes, b"id,v");

    let name = derive_split_name(&source);
    let mut output = split_file(&source, &name, &cfg).unwrap();
    let second = &mut output.chunks[1];
    inject_header(&header, second).unwrap();
    assert!(second.has_header);
    assert_eq!(second.lines, 3);
    assert_eq!(fs::read_to_string(&second.path).unwrap(), "id,v\n2,b\n3,c\n");

    let again = inject_header(&header, second);
    assert!(matches!(again, Err(AppError::HeaderError(_))));
    assert_eq!(fs::read_to_string(&second.path).unwrap(), "id,v\n2,b\n3,c\n");

    // 第一个分片本来就带表头
    assert!(inject_header(&header, &mut output.chunks[0]).is_err());
}

#[test]
fn empty_file_has_no_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "").unwrap();
    assert!(matches!(extract_header(&path), Err(AppError::InvalidFormat(_))));
}

#[cfg(unix)]
#[test]
fn scan_follows_file_symlinks_and_reports_dangling_ones() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let target = outside.path().join("real.csv");
    fs::write(&target, "h\n").unwrap();
    fs::create_dir(outside.path().join("sub")).unwrap();

    symlink(&target, dir.path().join("linked.csv")).unwrap();
    symlink(outside.path().join("gone.csv"), dir.path().join("broken.csv")).unwrap();
    // 指向目录的链接不跟随
    symlink(outside.path().join("sub"), dir.path().join("subdir")).unwrap();

    let result = scan_files(dir.path()).unwrap();
    assert_eq!(result.files, vec![dir.path().join("linked.csv")]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].0, dir.path().join("broken.csv"));
    assert!(matches!(result.errors[0].1, AppError::NotFound(_)));
}
