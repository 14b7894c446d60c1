//! 前缀树与游标
//!
//! - 节点以数组（arena）形式存放，下标即节点 ID，0 号为根。
//! - 构建完成后只读，可跨线程共享；游标仅持有对 Trie 的借用与当前节点 ID。
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{FilterError, Result};

/// 可作为 Trie 边标签的符号（字节、字符等）
pub trait Symbol: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> Symbol for T {}

pub(crate) type NodeId = usize;
pub(crate) const ROOT: NodeId = 0;

/// 单个节点：子节点映射 + 终止标记
#[derive(Debug, Clone)]
pub(crate) struct Node<S: Symbol> {
    pub(crate) terminal: bool,
    pub(crate) children: HashMap<S, NodeId>,
}

impl<S: Symbol> Node<S> {
    pub(crate) fn new() -> Self {
        Self { terminal: false, children: HashMap::new() }
    }
}

/// 不可变前缀树（由 `TrieBuilder` 或快照加载得到）
#[derive(Debug, Clone)]
pub struct Trie<S: Symbol> {
    nodes: Vec<Node<S>>,
}

impl<S: Symbol> Trie<S> {
    /// 调用方负责保证 nodes 构成以 0 号为根的树
    pub(crate) fn from_nodes(nodes: Vec<Node<S>>) -> Self {
        Self { nodes }
    }

    pub(crate) fn nodes(&self) -> &[Node<S>] {
        &self.nodes
    }

    /// 创建指向根节点的游标；没有根节点时返回 `TrieUnusable`
    pub fn cursor(&self) -> Result<Cursor<'_, S>> {
        if self.nodes.is_empty() {
            return Err(FilterError::TrieUnusable);
        }
        Ok(Cursor { trie: self, node: ROOT })
    }

    /// 节点总数（含根）
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 不同关键词数量（即终止节点数）
    pub fn keyword_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.terminal).count()
    }

    /// 词典为空（任何文本都不会命中）
    pub fn is_empty(&self) -> bool {
        self.keyword_count() == 0
    }

    /// 精确判断某关键词是否在词典中
    pub fn contains<I>(&self, keyword: I) -> bool
    where
        I: IntoIterator<Item = S>,
    {
        let mut cursor = match self.cursor() { Ok(c) => c, Err(_) => return false };
        for sym in keyword {
            if !cursor.walk(sym) { return false; }
        }
        cursor.is_terminal()
    }
}

/// 游标：指向某个 Trie 中的单个节点
///
/// 每次扫描尝试私有，开销仅为一个引用加一个下标。
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a, S: Symbol> {
    trie: &'a Trie<S>,
    node: NodeId,
}

impl<'a, S: Symbol> Cursor<'a, S> {
    /// 当前节点是否存在 `symbol` 子节点（不移动）
    pub fn is_walkable(&self, symbol: S) -> bool {
        self.trie.nodes[self.node].children.contains_key(&symbol)
    }

    /// 沿 `symbol` 前进一步。
    /// 调用前应先检查 `is_walkable`；不可走时返回 false 且游标保持不动。
    pub fn walk(&mut self, symbol: S) -> bool {
        match self.trie.nodes[self.node].children.get(&symbol) {
            Some(&next) => {
                self.node = next;
                true
            }
            None => false,
        }
    }

    /// 回到根节点
    pub fn rewind(&mut self) {
        self.node = ROOT;
    }

    /// 当前节点是否为某个关键词的结尾
    pub fn is_terminal(&self) -> bool {
        self.trie.nodes[self.node].terminal
    }

    /// 是否位于根节点
    pub fn is_at_root(&self) -> bool {
        self.node == ROOT
    }
}
