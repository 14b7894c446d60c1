//! 批量扫描主流程与并行调度
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::cache::{FilterCache, FilterHandle};
use crate::dict::{load_or_build, DictSource};
use crate::filter::KeywordFilter;
use crate::findings::{FileHit, JsonArrayWriter};
use crate::options::{ScanOptions, ScanStats};

/// 单个文件的处理结果
#[derive(Debug)]
enum FileOutcome {
    Hit(FileHit),
    Clean,
    Skipped,
    Failed,
}

impl FileOutcome {
    fn record(&self, stats: &mut ScanStats) {
        match self {
            FileOutcome::Hit(_) => { stats.files_scanned += 1; stats.files_matched += 1; }
            FileOutcome::Clean => stats.files_scanned += 1,
            FileOutcome::Skipped => stats.files_skipped += 1,
            FileOutcome::Failed => stats.files_failed += 1,
        }
    }
}

/// 加载词典后扫描目录，并将结果以 JSON 数组流式写入 `out`
pub fn scan_and_write(input_dir: &Path, dict: &DictSource, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    let filter = load_or_build(dict, opts.engine).with_context(|| format!("load dictionary {dict}"))?;
    let handle = FilterHandle::new(FilterCache::key_of(dict, opts.engine), filter);
    scan_with_handle(input_dir, &handle, out, opts)
}

/// 使用已加载的过滤器扫描目录
/// 稳定性保证：文件按文件名排序，输出顺序与线程数无关；每个文件至多输出一条（首个命中）
pub fn scan_with_handle(input_dir: &Path, handle: &FilterHandle, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    let mut files: Vec<PathBuf> = vec![];
    // 只扫描单层目录
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("walk {}", input_dir.display()))?;
        if entry.file_type().is_file() { files.push(entry.into_path()); }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    if threads > 1 && files.len() > 1 {
        return scan_parallel(files, handle, out, opts, threads);
    }

    let mut stats = ScanStats::default();
    let mut writer = JsonArrayWriter::begin(out)?;
    for path in &files {
        let outcome = scan_one(path, handle.filter(), opts.max_file_size);
        outcome.record(&mut stats);
        if let FileOutcome::Hit(hit) = &outcome { writer.push(hit)?; }
    }
    writer.finish()?;
    Ok(stats)
}

/// 并行调度：
/// - Rayon 线程池并行扫描
/// - 当前线程作为唯一 Writer，按 idx 重排后流式写 JSON
fn scan_parallel(
    files: Vec<PathBuf>,
    handle: &FilterHandle,
    out: &mut dyn Write,
    opts: &ScanOptions,
    threads: usize,
) -> Result<ScanStats> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rayon pool")?;

    let (tx, rx) = channel::bounded::<(usize, FileOutcome)>(256);
    let handle = handle.clone();
    let max_file_size = opts.max_file_size;

    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            files.par_iter().enumerate().for_each(|(idx, path)| {
                let outcome = scan_one(path, handle.filter(), max_file_size);
                let _ = tx.send((idx, outcome));
            });
        });
        // 线程结束时 Sender 被丢弃，Receiver 收到关闭信号
    });

    let mut stats = ScanStats::default();
    let mut writer = JsonArrayWriter::begin(out)?;
    let mut next_idx = 0usize;
    let mut buffer: BTreeMap<usize, FileOutcome> = BTreeMap::new();

    while let Ok((idx, outcome)) = rx.recv() {
        buffer.insert(idx, outcome);
        while let Some(outcome) = buffer.remove(&next_idx) {
            outcome.record(&mut stats);
            if let FileOutcome::Hit(hit) = &outcome { writer.push(hit)?; }
            next_idx += 1;
        }
    }

    if scan_thread.join().is_err() {
        anyhow::bail!("scan worker panicked");
    }
    writer.finish()?;
    Ok(stats)
}

fn scan_one(path: &Path, filter: &KeywordFilter, max_file_size: Option<u64>) -> FileOutcome {
    let file_name = match path.file_name().and_then(|s| s.to_str()) { Some(s) => s, None => return FileOutcome::Failed };
    if let Some(max) = max_file_size {
        if let Ok(md) = std::fs::metadata(path) {
            if md.len() > max {
                debug!(file = file_name, size = md.len(), "skipped: larger than max_file_size");
                return FileOutcome::Skipped;
            }
        }
    }
    match scan_file(path, file_name, filter) {
        Ok(Some(hit)) => FileOutcome::Hit(hit),
        Ok(None) => FileOutcome::Clean,
        Err(e) => {
            debug!(file = file_name, error = %e, "scan failed");
            FileOutcome::Failed
        }
    }
}

/// 扫描单个文件，返回首个命中
/// - Bytes 引擎：读取全部字节，命中值用 `from_utf8_lossy` 转换以便写入 JSON
/// - Utf8 引擎：文件必须是合法 UTF-8，否则视为失败
pub(crate) fn scan_file(path: &Path, file_name: &str, filter: &KeywordFilter) -> Result<Option<FileHit>> {
    match filter {
        KeywordFilter::Bytes(_) => {
            let buf = std::fs::read(path)?;
            let Some(m) = filter.find_first_bytes(&buf)? else { return Ok(None) };
            let keyword = String::from_utf8_lossy(&buf[m.offset..m.end()]).into_owned();
            Ok(Some(FileHit { file: file_name.to_string(), offset: m.offset, length: m.length, keyword }))
        }
        KeywordFilter::Utf8(_) => {
            let text = std::fs::read_to_string(path)?;
            let Some(m) = filter.find_first_str(&text)? else { return Ok(None) };
            let keyword = m.char_byte_range(&text).map(|r| text[r].to_string()).unwrap_or_default();
            Ok(Some(FileHit { file: file_name.to_string(), offset: m.offset, length: m.length, keyword }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ScanEngine;

    #[test]
    fn scan_file_reports_keyword_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.txt");
        std::fs::write(&p, "hello 世界 world").unwrap();

        let utf8 = KeywordFilter::from_keywords(["世界"], ScanEngine::Utf8).unwrap();
        let hit = scan_file(&p, "a.txt", &utf8).unwrap().unwrap();
        assert_eq!((hit.offset, hit.length, hit.keyword.as_str()), (6, 2, "世界"));

        let bytes = KeywordFilter::from_keywords(["世界"], ScanEngine::Bytes).unwrap();
        let hit = scan_file(&p, "a.txt", &bytes).unwrap().unwrap();
        assert_eq!((hit.offset, hit.length, hit.keyword.as_str()), (6, 6, "世界"));
    }

    #[test]
    fn utf8_engine_fails_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bin");
        std::fs::write(&p, [0xffu8, 0xfe, b'x']).unwrap();
        let f = KeywordFilter::from_keywords(["x"], ScanEngine::Utf8).unwrap();
        assert!(scan_file(&p, "bin", &f).is_err());
        assert!(matches!(scan_one(&p, &f, None), FileOutcome::Failed));
    }

    #[test]
    fn oversized_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("big");
        std::fs::write(&p, "x".repeat(100)).unwrap();
        let f = KeywordFilter::from_keywords(["x"], ScanEngine::Bytes).unwrap();
        assert!(matches!(scan_one(&p, &f, Some(10)), FileOutcome::Skipped));
        assert!(matches!(scan_one(&p, &f, Some(100)), FileOutcome::Hit(_)));
    }
}
