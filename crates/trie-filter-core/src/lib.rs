//! 关键词首个命中扫描库
//!
//! 设计要点：
//! - 词典构建为不可变前缀树（Trie），构建一次、多线程共享只读。
//! - 每次查询使用私有游标，从左到右逐个起点尝试；到达终止节点即报告（最短完成匹配）。
//! - 只报告第一个命中；不是 Aho-Corasick，最坏 O(n·k)。
//! - 词典通过显式句柄（`FilterHandle`）传递，缓存只负责构建与发布。

mod options;
mod types;
mod error;
mod trie;
mod builder;
mod search;
mod snapshot;
mod filter;
mod dict;
mod cache;
mod findings;
mod scan;

pub use options::{ScanOptions, ScanEngine, ScanStats};
pub use types::{Match, OutputItem};
pub use error::{FilterError, Result};
pub use trie::{Cursor, Symbol, Trie};
pub use builder::TrieBuilder;
pub use search::find_first;
pub use filter::KeywordFilter;
pub use dict::{load_or_build, read_byte_keywords, read_keywords, DictSource};
pub use cache::{CacheStats, FilterCache, FilterHandle};
pub use scan::{scan_and_write, scan_with_handle};
