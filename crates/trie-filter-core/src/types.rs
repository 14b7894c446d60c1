//! 公共类型（对外暴露）
use serde::Serialize;

/// 单次命中：起始位置与长度，均以符号为单位（Bytes 引擎为字节，Utf8 引擎为字符）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
}

impl Match {
    /// 命中区间的结束位置（不含）
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// 将字符单位的命中区间换算为 `text` 中的字节区间（Utf8 引擎）
    pub fn char_byte_range(&self, text: &str) -> Option<std::ops::Range<usize>> {
        let mut idx = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
        let start = idx.nth(self.offset)?;
        let end = if self.length == 0 { start } else { idx.nth(self.length - 1)? };
        Some(start..end)
    }
}

/// 批量扫描的输出项（对应 result.json 的单个元素）
#[derive(Debug, Clone, Serialize)]
pub struct OutputItem<'a> {
    pub file: &'a str,
    pub offset: usize,
    pub length: usize,
    pub keyword: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_range_handles_multibyte() {
        let text = "一二三四";
        let m = Match { offset: 1, length: 2 };
        assert_eq!(m.char_byte_range(text), Some(3..9));
        assert_eq!(&text[3..9], "二三");
        assert_eq!(m.end(), 3);
    }

    #[test]
    fn char_range_at_end_of_text() {
        let m = Match { offset: 2, length: 1 };
        assert_eq!(m.char_byte_range("abc"), Some(2..3));
        let out = Match { offset: 3, length: 1 };
        assert_eq!(out.char_byte_range("abc"), None);
    }
}
