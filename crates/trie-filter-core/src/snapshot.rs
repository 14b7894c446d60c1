//! Trie 快照（JSON）
//!
//! 格式：
//! ```json
//! { "version": 1, "engine": "utf8",
//!   "nodes": [ { "terminal": false, "edges": [["c", 1]] }, ... ] }
//! ```
//! 0 号节点为根。加载时做完整校验，保证得到的仍是一棵以根为起点的树。
use std::collections::{HashMap, HashSet, VecDeque};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::options::ScanEngine;
use crate::trie::{Node, Symbol, Trie, ROOT};

pub(crate) const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct SnapshotHeader {
    version: u32,
    engine: ScanEngine,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
struct SnapshotNode<S> {
    #[serde(default)]
    terminal: bool,
    #[serde(default)]
    edges: Vec<(S, usize)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<S> {
    version: u32,
    engine: ScanEngine,
    nodes: Vec<SnapshotNode<S>>,
}

/// 将 Trie 序列化为 JSON 快照（边按符号排序，输出稳定）
pub(crate) fn to_json<S>(trie: &Trie<S>, engine: ScanEngine) -> Result<String>
where
    S: Symbol + Ord + Serialize,
{
    let nodes = trie
        .nodes()
        .iter()
        .map(|n| {
            let mut edges: Vec<(S, usize)> = n.children.iter().map(|(s, id)| (*s, *id)).collect();
            edges.sort();
            SnapshotNode { terminal: n.terminal, edges }
        })
        .collect();
    let snap = Snapshot { version: SNAPSHOT_VERSION, engine, nodes };
    serde_json::to_string(&snap).map_err(|e| FilterError::unavailable("<snapshot>", e))
}

/// 从 JSON 快照恢复 Trie；`source_name` 仅用于错误信息
pub(crate) fn from_json<S>(json: &str, engine: ScanEngine, source_name: &str) -> Result<Trie<S>>
where
    S: Symbol + DeserializeOwned,
{
    let bad = |reason: String| FilterError::unavailable(source_name, reason);

    // 先读头部，引擎不匹配时给出明确原因
    let header: SnapshotHeader = serde_json::from_str(json).map_err(|e| bad(format!("malformed snapshot: {e}")))?;
    if header.version != SNAPSHOT_VERSION {
        return Err(bad(format!("unsupported snapshot version {}", header.version)));
    }
    if header.engine != engine {
        return Err(bad(format!(
            "snapshot built for engine {}, requested {}",
            header.engine.as_str(),
            engine.as_str()
        )));
    }

    let snap: Snapshot<S> = serde_json::from_str(json).map_err(|e| bad(format!("malformed snapshot: {e}")))?;
    let total = snap.nodes.len();
    if total == 0 {
        return Err(bad("snapshot has no root node".into()));
    }
    if snap.nodes[ROOT].terminal {
        return Err(bad("root node must not be terminal".into()));
    }

    let mut referenced: HashSet<usize> = HashSet::with_capacity(total);
    let mut nodes: Vec<Node<S>> = Vec::with_capacity(total);
    for (id, sn) in snap.nodes.into_iter().enumerate() {
        let mut children: HashMap<S, usize> = HashMap::with_capacity(sn.edges.len());
        for (sym, child) in sn.edges {
            if child >= total || child == ROOT {
                return Err(bad(format!("node {id}: edge to invalid node {child}")));
            }
            if !referenced.insert(child) {
                return Err(bad(format!("node {child} has more than one parent")));
            }
            if children.insert(sym, child).is_some() {
                return Err(bad(format!("node {id}: duplicate edge symbol {sym:?}")));
            }
        }
        nodes.push(Node { terminal: sn.terminal, children });
    }

    // 可达性检查：排除与根不连通的环
    let mut visited = 0usize;
    let mut queue = VecDeque::from([ROOT]);
    while let Some(id) = queue.pop_front() {
        visited += 1;
        queue.extend(nodes[id].children.values().copied());
    }
    if visited != total {
        return Err(bad(format!("{} node(s) unreachable from root", total - visited)));
    }

    Ok(Trie::from_nodes(nodes))
}
