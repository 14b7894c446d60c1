//! 词典加载（纯文本 / TOML / JSON 快照）
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FilterError, Result};
use crate::filter::KeywordFilter;
use crate::options::ScanEngine;

/// 词典来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictSource {
    /// 内存中的关键词列表
    Keywords(Vec<String>),
    /// 词典文件；按扩展名决定格式：`.toml`、`.json`（快照），其余按纯文本逐行读取
    File(PathBuf),
}

impl DictSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DictSource::File(path.into())
    }

    pub fn keywords<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        DictSource::Keywords(keywords.into_iter().map(Into::into).collect())
    }

    /// 缓存键
    /// - 文件：规范化后的绝对路径（文件不存在时退回原路径）
    /// - 内存列表：去重排序后的完整内容（JSON 编码），与顺序和重复无关；列表越大键越长
    pub fn key(&self) -> String {
        match self {
            DictSource::File(p) => {
                let p = std::fs::canonicalize(p).unwrap_or_else(|_| p.clone());
                format!("file:{}", p.display())
            }
            DictSource::Keywords(kws) => {
                let mut set: Vec<&str> = kws.iter().map(String::as_str).collect();
                set.sort_unstable();
                set.dedup();
                format!("inline:{}", serde_json::to_string(&set).unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for DictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictSource::File(p) => write!(f, "{}", p.display()),
            DictSource::Keywords(kws) => write!(f, "<{} inline keywords>", kws.len()),
        }
    }
}

/// 单组关键词（TOML 中的 `[[groups]]`）
#[derive(Debug, Clone, Deserialize)]
struct GroupEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// 顶层 TOML 词典结构
#[derive(Debug, Clone, Deserialize)]
struct DictFile {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    groups: Vec<GroupEntry>,
}

/// 加载或构建过滤器
/// - Bytes 引擎读取纯文本词典时按原始字节处理，不要求 UTF-8；TOML 词典始终是 UTF-8
/// - 文件不存在、不可读或格式错误：`DictionaryUnavailable`
/// - 存在空关键词：`InvalidKeyword`
/// - 零个关键词合法，得到的过滤器永不命中
pub fn load_or_build(source: &DictSource, engine: ScanEngine) -> Result<KeywordFilter> {
    let filter = match source {
        DictSource::Keywords(kws) => KeywordFilter::from_keywords(kws, engine)?,
        DictSource::File(path) => match (extension(path).as_deref(), engine) {
            (Some("json"), _) => {
                let txt = read_text(path)?;
                KeywordFilter::from_snapshot_json(&txt, engine, &path.display().to_string())?
            }
            (Some("toml"), _) | (_, ScanEngine::Utf8) => KeywordFilter::from_keywords(read_keywords(path)?, engine)?,
            (_, ScanEngine::Bytes) => KeywordFilter::from_byte_keywords(read_byte_keywords(path)?)?,
        },
    };
    info!(
        source = %source,
        engine = engine.as_str(),
        keywords = filter.keyword_count(),
        nodes = filter.node_count(),
        "dictionary loaded"
    );
    Ok(filter)
}

/// 从关键词文件（TOML 或纯文本）读取关键词列表
pub fn read_keywords(path: &Path) -> Result<Vec<String>> {
    let txt = read_text(path)?;
    if extension(path).as_deref() == Some("toml") {
        let parsed: DictFile = toml::from_str(&txt)
            .map_err(|e| FilterError::unavailable(path.display().to_string(), e))?;
        let mut out = parsed.keywords;
        for g in parsed.groups {
            debug!(group = g.name.as_deref().unwrap_or("-"), count = g.keywords.len(), "keyword group");
            out.extend(g.keywords);
        }
        debug!(path = %path.display(), count = out.len(), "toml dictionary parsed");
        return Ok(out);
    }
    Ok(parse_plain(&txt))
}

/// 按原始字节读取纯文本词典（Bytes 引擎）
pub fn read_byte_keywords(path: &Path) -> Result<Vec<Vec<u8>>> {
    let buf = std::fs::read(path).map_err(|e| FilterError::unavailable(path.display().to_string(), e))?;
    Ok(parse_plain_bytes(&buf))
}

/// 纯文本：每行一个关键词，去掉行尾 `\r`。
/// 跳过空行、只含 ASCII 空白的行（记 debug 日志）以及 `#` 开头的注释行；
/// 因此纯空白关键词无法通过纯文本词典表达，需要时改用 TOML。
fn parse_plain(txt: &str) -> Vec<String> {
    txt.lines()
        .enumerate()
        .map(|(no, l)| (no, l.strip_suffix('\r').unwrap_or(l)))
        .filter(|(no, l)| !skip_line(l.as_bytes(), *no))
        .map(|(_, l)| l.to_string())
        .collect()
}

fn parse_plain_bytes(buf: &[u8]) -> Vec<Vec<u8>> {
    buf.split(|&b| b == b'\n')
        .enumerate()
        .map(|(no, l)| (no, l.strip_suffix(&b"\r"[..]).unwrap_or(l)))
        .filter(|(no, l)| !skip_line(l, *no))
        .map(|(_, l)| l.to_vec())
        .collect()
}

fn skip_line(line: &[u8], no: usize) -> bool {
    if line.is_empty() || line.starts_with(b"#") {
        return true;
    }
    if line.iter().all(u8::is_ascii_whitespace) {
        debug!(line = no + 1, "skipped whitespace-only dictionary line");
        return true;
    }
    false
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| FilterError::unavailable(path.display().to_string(), e))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase())
}
