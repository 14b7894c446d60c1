//! 单文件命中（内部使用）
use std::io::Write;

use anyhow::Result;

use crate::types::OutputItem;

/// 单个文件的首个命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileHit {
    pub(crate) file: String,
    pub(crate) offset: usize,
    pub(crate) length: usize,
    pub(crate) keyword: String,
}

/// 流式 JSON 数组写出器：逐项写入，结束时补 `]`
pub(crate) struct JsonArrayWriter<'w> {
    out: &'w mut dyn Write,
    first: bool,
}

impl<'w> JsonArrayWriter<'w> {
    pub(crate) fn begin(out: &'w mut dyn Write) -> Result<Self> {
        write!(out, "[")?;
        Ok(Self { out, first: true })
    }

    pub(crate) fn push(&mut self, hit: &FileHit) -> Result<()> {
        if !self.first { write!(self.out, ",")?; } else { self.first = false; }
        let item = OutputItem { file: &hit.file, offset: hit.offset, length: hit.length, keyword: &hit.keyword };
        serde_json::to_writer(&mut *self.out, &item)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<()> {
        write!(self.out, "]")?;
        Ok(())
    }
}
