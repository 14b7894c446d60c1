//! 关键词过滤器：按引擎封装具体符号类型的 Trie
use std::ops::Range;

use crate::builder::TrieBuilder;
use crate::error::Result;
use crate::options::ScanEngine;
use crate::search::find_first;
use crate::snapshot;
use crate::trie::Trie;
use crate::types::Match;

/// 已构建的关键词过滤器（不可变）
#[derive(Debug, Clone)]
pub enum KeywordFilter {
    /// 字节符号（与原始字节流一一对应）
    Bytes(Trie<u8>),
    /// Unicode 字符符号
    Utf8(Trie<char>),
}

impl KeywordFilter {
    /// 从关键词字符串构建；任一关键词为空则返回 `InvalidKeyword`
    pub fn from_keywords<I, K>(keywords: I, engine: ScanEngine) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        match engine {
            ScanEngine::Bytes => {
                let mut b = TrieBuilder::new();
                for kw in keywords { b.insert(kw.as_ref().bytes())?; }
                Ok(KeywordFilter::Bytes(b.build()))
            }
            ScanEngine::Utf8 => {
                let mut b = TrieBuilder::new();
                for kw in keywords { b.insert(kw.as_ref().chars())?; }
                Ok(KeywordFilter::Utf8(b.build()))
            }
        }
    }

    /// 从原始字节关键词构建 Bytes 过滤器；关键词可以是任意编码（GBK、Latin-1 等）
    pub fn from_byte_keywords<I, K>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut b = TrieBuilder::new();
        for kw in keywords { b.insert(kw.as_ref().iter().copied())?; }
        Ok(KeywordFilter::Bytes(b.build()))
    }

    /// 从 JSON 快照恢复
    pub fn from_snapshot_json(json: &str, engine: ScanEngine, source_name: &str) -> Result<Self> {
        match engine {
            ScanEngine::Bytes => Ok(KeywordFilter::Bytes(snapshot::from_json(json, engine, source_name)?)),
            ScanEngine::Utf8 => Ok(KeywordFilter::Utf8(snapshot::from_json(json, engine, source_name)?)),
        }
    }

    /// 序列化为 JSON 快照
    pub fn to_snapshot_json(&self) -> Result<String> {
        match self {
            KeywordFilter::Bytes(t) => snapshot::to_json(t, ScanEngine::Bytes),
            KeywordFilter::Utf8(t) => snapshot::to_json(t, ScanEngine::Utf8),
        }
    }

    pub fn engine(&self) -> ScanEngine {
        match self {
            KeywordFilter::Bytes(_) => ScanEngine::Bytes,
            KeywordFilter::Utf8(_) => ScanEngine::Utf8,
        }
    }

    pub fn keyword_count(&self) -> usize {
        match self {
            KeywordFilter::Bytes(t) => t.keyword_count(),
            KeywordFilter::Utf8(t) => t.keyword_count(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            KeywordFilter::Bytes(t) => t.node_count(),
            KeywordFilter::Utf8(t) => t.node_count(),
        }
    }

    /// 查找首个命中（单位由引擎决定：字节或字符）
    pub fn find_first_str(&self, text: &str) -> Result<Option<Match>> {
        match self {
            KeywordFilter::Bytes(t) => find_first(t, text.as_bytes()),
            KeywordFilter::Utf8(t) => {
                let syms: Vec<char> = text.chars().collect();
                find_first(t, &syms)
            }
        }
    }

    /// 对原始字节查找首个命中
    /// - Bytes 引擎直接按字节匹配
    /// - Utf8 引擎先做有损解码（非法序列变为 U+FFFD），偏移按解码后的字符计
    pub fn find_first_bytes(&self, text: &[u8]) -> Result<Option<Match>> {
        match self {
            KeywordFilter::Bytes(t) => find_first(t, text),
            KeywordFilter::Utf8(_) => self.find_first_str(&String::from_utf8_lossy(text)),
        }
    }

    /// 把命中区间换算为 `text` 中的字节区间
    pub fn byte_range(&self, text: &str, m: &Match) -> Option<Range<usize>> {
        match self {
            KeywordFilter::Bytes(_) => (m.end() <= text.len()).then(|| m.offset..m.end()),
            KeywordFilter::Utf8(_) => m.char_byte_range(text),
        }
    }

    /// 逐次查找首个命中并以 `mask` 替换，命中之后继续查找；返回替换后的文本与命中次数。
    /// Bytes 引擎的命中若切在多字节字符中间，会扩展到完整字符。
    pub fn redact(&self, text: &str, mask: char) -> Result<(String, usize)> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut hits = 0usize;

        while let Some(m) = self.find_first_str(rest)? {
            let Some(range) = self.byte_range(rest, &m) else { break };
            let start = floor_char_boundary(rest, range.start);
            let end = ceil_char_boundary(rest, range.end);
            out.push_str(&rest[..start]);
            out.extend(rest[start..end].chars().map(|_| mask));
            rest = &rest[end..];
            hits += 1;
        }
        out.push_str(rest);
        Ok((out, hits))
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) { i += 1; }
    i
}
