//! 错误类型（对外暴露）
use thiserror::Error;

/// 库内统一结果类型
pub type Result<T> = std::result::Result<T, FilterError>;

/// 过滤器错误分类
/// - 构建期：`InvalidKeyword`
/// - 加载期：`DictionaryUnavailable`
/// - 查询期：`TrieUnusable` / `NotLoaded`
///
/// 注意：“未命中”不是错误，由 `Ok(None)` 表示。
#[derive(Debug, Error)]
pub enum FilterError {
    /// 关键词为空（第 index 个，从 0 开始）；整个构建失败，不发布部分结果
    #[error("invalid keyword at index {index}: keyword must not be empty")]
    InvalidKeyword { index: usize },

    /// 词典源不可读或格式不合法（区别于“加载成功但为空”）
    #[error("dictionary unavailable: {source_name}: {reason}")]
    DictionaryUnavailable { source_name: String, reason: String },

    /// Trie 没有有效根节点，无法查询（区别于 NoMatch）
    #[error("trie is unusable: no valid root node")]
    TrieUnusable,

    /// 缓存中尚未发布该词典
    #[error("dictionary not loaded: {key}")]
    NotLoaded { key: String },
}

impl FilterError {
    pub(crate) fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        FilterError::DictionaryUnavailable { source_name: source_name.into(), reason: reason.to_string() }
    }
}
