//! Trie 构建器
use crate::error::{FilterError, Result};
use crate::trie::{Node, NodeId, Symbol, Trie, ROOT};

/// 逐个插入关键词，最后一次性产出不可变的 `Trie`
#[derive(Debug, Clone)]
pub struct TrieBuilder<S: Symbol> {
    nodes: Vec<Node<S>>,
    /// 已提交的关键词个数（含重复），用于错误定位
    offered: usize,
}

impl<S: Symbol> Default for TrieBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Symbol> TrieBuilder<S> {
    pub fn new() -> Self {
        Self { nodes: vec![Node::new()], offered: 0 }
    }

    /// 插入单个关键词；空关键词返回 `InvalidKeyword`
    pub fn insert<I>(&mut self, keyword: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
    {
        let index = self.offered;
        self.offered += 1;

        let mut node: NodeId = ROOT;
        let mut consumed = 0usize;
        for sym in keyword {
            node = match self.nodes[node].children.get(&sym) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::new());
                    self.nodes[node].children.insert(sym, next);
                    next
                }
            };
            consumed += 1;
        }
        if consumed == 0 {
            return Err(FilterError::InvalidKeyword { index });
        }
        self.nodes[node].terminal = true;
        Ok(())
    }

    /// 已插入的节点数（含根）
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn build(self) -> Trie<S> {
        Trie::from_nodes(self.nodes)
    }

    /// 从关键词集合构建；任一关键词为空则整体失败
    pub fn from_keywords<K, I>(keywords: K) -> Result<Trie<S>>
    where
        K: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
    {
        let mut builder = Self::new();
        for kw in keywords {
            builder.insert(kw)?;
        }
        Ok(builder.build())
    }
}
