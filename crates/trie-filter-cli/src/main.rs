use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trie_filter_core::{scan_with_handle, DictSource, FilterCache, FilterHandle, Match, ScanEngine, ScanOptions};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "trie-filter", version, about = "基于前缀树的关键词过滤器")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 查找首个命中，输出 [offset,length]；未命中输出 []
    Search {
        /// 词典文件（.txt / .toml / .json 快照）
        #[arg(long)]
        dict: PathBuf,

        /// 扫描引擎：bytes 或 utf8（默认 bytes）
        #[arg(long, default_value = "bytes", value_parser = ["bytes", "utf8"])]
        engine: String,

        /// 待检测文本
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        /// 待检测文件
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// 扫描目录，每个命中文件输出一条记录到 JSON 数组
    Scan {
        #[arg(long)]
        dict: PathBuf,

        /// 输入目录（仅扫描第一层文件）
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）
        #[arg(long, default_value = "./result.json")]
        output: PathBuf,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        #[arg(long, default_value = "bytes", value_parser = ["bytes", "utf8"])]
        engine: String,
    },

    /// 构建词典并写出 JSON 快照
    Compile {
        #[arg(long)]
        dict: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long, default_value = "bytes", value_parser = ["bytes", "utf8"])]
        engine: String,
    },

    /// 将文本中的命中依次替换为掩码字符
    Redact {
        #[arg(long)]
        dict: PathBuf,

        #[arg(long)]
        text: String,

        #[arg(long, default_value_t = '*')]
        mask: char,

        #[arg(long, default_value = "utf8", value_parser = ["bytes", "utf8"])]
        engine: String,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let cache = FilterCache::new();

    match cli.command {
        Commands::Search { dict, engine, text, input } => {
            let handle = load(&cache, dict, &engine)?;
            let found = match (text, input) {
                (Some(t), _) => handle.search_str(&t)?,
                (None, Some(path)) => search_file(&handle, &path)?,
                (None, None) => bail!("either --text or --input is required"),
            };
            println!("{}", format_match(found));
        }
        Commands::Scan { dict, input, output, threads, max_file_size, engine } => {
            info!(?input, ?output, "starting scan");
            let handle = load(&cache, dict, &engine)?;

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);
            let opts = ScanOptions { max_file_size, engine: parse_engine(&engine), threads: parse_threads(&threads) };
            let stats = scan_with_handle(&input, &handle, &mut out, &opts).context("scan and write failed")?;
            out.flush().context("flush output file")?;

            info!(
                files_scanned = stats.files_scanned,
                files_matched = stats.files_matched,
                files_failed = stats.files_failed,
                files_skipped = stats.files_skipped,
                "scan finished"
            );
        }
        Commands::Compile { dict, output, engine } => {
            let handle = load(&cache, dict, &engine)?;
            let json = handle.filter().to_snapshot_json()?;
            std::fs::write(&output, json).with_context(|| format!("write snapshot {}", output.display()))?;
            info!(?output, keywords = handle.filter().keyword_count(), "snapshot written");
        }
        Commands::Redact { dict, text, mask, engine } => {
            let handle = load(&cache, dict, &engine)?;
            let (redacted, hits) = handle.filter().redact(&text, mask)?;
            debug!(hits, "redaction finished");
            println!("{redacted}");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 只保留结果
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load(cache: &FilterCache, dict: PathBuf, engine: &str) -> Result<FilterHandle> {
    let source = DictSource::File(dict);
    let handle = cache
        .load(&source, parse_engine(engine))
        .with_context(|| format!("load dictionary {source}"))?;
    debug!(stats = ?cache.stats(), "filter cache");
    Ok(handle)
}

fn search_file(handle: &FilterHandle, path: &Path) -> Result<Option<Match>> {
    let found = match handle.filter().engine() {
        ScanEngine::Bytes => handle.search_bytes(&std::fs::read(path).with_context(|| format!("read {}", path.display()))?)?,
        ScanEngine::Utf8 => handle.search_str(&std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?)?,
    };
    Ok(found)
}

/// 输出格式：命中为 [offset,length]，未命中为 []
fn format_match(found: Option<Match>) -> String {
    match found {
        Some(m) => serde_json::json!([m.offset, m.length]).to_string(),
        None => "[]".to_string(),
    }
}

/// 解析扫描引擎参数（clap 已限定取值）
fn parse_engine(s: &str) -> ScanEngine {
    s.parse().unwrap_or(ScanEngine::Bytes)
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_argument() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("x"), None);
    }

    #[test]
    fn match_output_shape() {
        assert_eq!(format_match(Some(Match { offset: 2, length: 3 })), "[2,3]");
        assert_eq!(format_match(None), "[]");
    }

    #[test]
    fn cli_parses_search() {
        let cli = Cli::try_parse_from(["trie-filter", "search", "--dict", "d.txt", "--text", "hi", "--engine", "utf8"]).unwrap();
        match cli.command {
            Commands::Search { engine, text, .. } => {
                assert_eq!(engine, "utf8");
                assert_eq!(text.as_deref(), Some("hi"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
