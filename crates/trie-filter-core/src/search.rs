//! 首个命中搜索
//!
//! 自左向右逐个尝试起点；每个起点从根开始贪心前进，
//! 一旦到达终止节点立即停止（最短完成匹配），不回溯、无失败指针。
//! 最坏复杂度 O(n·k)，n 为文本长度，k 为最长关键词长度。
use crate::error::Result;
use crate::trie::{Symbol, Trie};
use crate::types::Match;

/// 在 `text` 中查找第一个命中的关键词
/// - `Ok(Some(m))`：命中
/// - `Ok(None)`：未命中（正常结果）
/// - `Err(TrieUnusable)`：Trie 无法查询
pub fn find_first<S: Symbol>(trie: &Trie<S>, text: &[S]) -> Result<Option<Match>> {
    let mut cursor = trie.cursor()?;
    let mut start = 0usize;

    while start < text.len() {
        cursor.rewind();
        if !cursor.is_walkable(text[start]) {
            start += 1;
            continue;
        }
        cursor.walk(text[start]);
        let mut pos = start + 1;

        // 到达终止节点即停，即便还能继续往下走
        while pos < text.len() && cursor.is_walkable(text[pos]) && !cursor.is_terminal() {
            cursor.walk(text[pos]);
            pos += 1;
        }

        if cursor.is_terminal() {
            return Ok(Some(Match { offset: start, length: pos - start }));
        }
        start += 1;
    }

    Ok(None)
}
