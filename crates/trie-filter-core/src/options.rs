//! 扫描选项与统计信息（模块）
use serde::{Deserialize, Serialize};

/// 扫描引擎类型（决定文本如何拆分为符号）
/// - Bytes：每个字节一个符号，偏移与长度以字节计；不要求输入是合法 UTF-8。
/// - Utf8：每个 Unicode 字符一个符号，偏移与长度以字符计。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanEngine {
    Bytes,
    Utf8,
}

impl ScanEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanEngine::Bytes => "bytes",
            ScanEngine::Utf8 => "utf8",
        }
    }
}

impl std::str::FromStr for ScanEngine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bytes" => Ok(ScanEngine::Bytes),
            "utf8" | "utf-8" => Ok(ScanEngine::Utf8),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}

/// 批量扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 扫描引擎：Bytes（字节级）或 Utf8（基于字符）
    pub engine: ScanEngine,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_file_size: None,
            engine: ScanEngine::Bytes,
            threads: None,
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_matched: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
}
