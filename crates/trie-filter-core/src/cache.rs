//! 过滤器缓存（线程安全，可跨线程共享）
//!
//! - 构建在本地完成后，以 `Arc` 一次性发布；读者只会看到“未加载”或“完整的过滤器”。
//! - 构建过程由 `load_lock` 串行化，同一词典在并发首次加载下只构建一次。
//! - 查询方持有 `FilterHandle` 后不再触碰缓存锁；条目被替换或卸载不影响已发出的句柄。
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::dict::{load_or_build, DictSource};
use crate::error::{FilterError, Result};
use crate::filter::KeywordFilter;
use crate::options::ScanEngine;
use crate::types::Match;

/// 已发布过滤器的句柄（克隆开销为一次引用计数）
#[derive(Debug, Clone)]
pub struct FilterHandle {
    key: Arc<str>,
    filter: Arc<KeywordFilter>,
}

impl FilterHandle {
    pub fn new(key: impl Into<Arc<str>>, filter: KeywordFilter) -> Self {
        Self { key: key.into(), filter: Arc::new(filter) }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filter(&self) -> &KeywordFilter {
        &self.filter
    }

    pub fn search_str(&self, text: &str) -> Result<Option<Match>> {
        self.filter.find_first_str(text)
    }

    pub fn search_bytes(&self, text: &[u8]) -> Result<Option<Match>> {
        self.filter.find_first_bytes(text)
    }

    /// 两个句柄是否指向同一份已构建的数据
    pub fn same_filter(&self, other: &FilterHandle) -> bool {
        Arc::ptr_eq(&self.filter, &other.filter)
    }
}

/// 缓存计数（对应扩展里的 init 次数 / 新建次数）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub load_calls: usize,
    pub builds: usize,
    pub hits: usize,
    pub failures: usize,
}

#[derive(Debug, Default)]
pub struct FilterCache {
    entries: RwLock<HashMap<String, FilterHandle>>,
    load_lock: Mutex<()>,
    load_calls: AtomicUsize,
    builds: AtomicUsize,
    hits: AtomicUsize,
    failures: AtomicUsize,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缓存键：引擎 + 来源
    pub fn key_of(source: &DictSource, engine: ScanEngine) -> String {
        format!("{}:{}", engine.as_str(), source.key())
    }

    /// 加载词典：已发布则直接复用，否则构建并发布
    pub fn load(&self, source: &DictSource, engine: ScanEngine) -> Result<FilterHandle> {
        self.load_calls.fetch_add(1, Ordering::Relaxed);
        let key = Self::key_of(source, engine);
        if let Some(h) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(h);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // 等锁期间可能已被其他线程发布
        if let Some(h) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%key, "dictionary published by concurrent loader");
            return Ok(h);
        }
        self.build_and_publish(key, source, engine)
    }

    /// 显式刷新：总是重新构建；失败时保留旧条目
    pub fn reload(&self, source: &DictSource, engine: ScanEngine) -> Result<FilterHandle> {
        self.load_calls.fetch_add(1, Ordering::Relaxed);
        let key = Self::key_of(source, engine);
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.build_and_publish(key, source, engine)
    }

    fn build_and_publish(&self, key: String, source: &DictSource, engine: ScanEngine) -> Result<FilterHandle> {
        let filter = match load_or_build(source, engine) {
            Ok(f) => f,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%key, error = %e, "dictionary load failed; cache left unchanged");
                return Err(e);
            }
        };
        self.builds.fetch_add(1, Ordering::Relaxed);
        let handle = FilterHandle::new(key.as_str(), filter);
        let replaced = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), handle.clone())
            .is_some();
        info!(%key, replaced, "dictionary published");
        Ok(handle)
    }

    /// 获取已发布的句柄；未加载返回 None（不等待进行中的构建）
    pub fn get(&self, key: &str) -> Option<FilterHandle> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// 按键查询；未加载时返回 `NotLoaded`
    pub fn search(&self, key: &str, text: &str) -> Result<Option<Match>> {
        match self.get(key) {
            Some(h) => h.search_str(text),
            None => Err(FilterError::NotLoaded { key: key.to_string() }),
        }
    }

    /// 移除条目；已发出的句柄在最后一个克隆释放后才会真正释放数据
    pub fn unload(&self, key: &str) -> bool {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            load_calls: self.load_calls.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_load_reuses_handle() {
        let cache = FilterCache::new();
        let src = DictSource::keywords(["spam"]);
        let a = cache.load(&src, ScanEngine::Utf8).unwrap();
        let b = cache.load(&src, ScanEngine::Utf8).unwrap();
        assert!(a.same_filter(&b));
        assert_eq!(cache.stats(), CacheStats { load_calls: 2, builds: 1, hits: 1, failures: 0 });
    }

    #[test]
    fn engines_are_cached_separately() {
        let cache = FilterCache::new();
        let src = DictSource::keywords(["spam"]);
        let a = cache.load(&src, ScanEngine::Utf8).unwrap();
        let b = cache.load(&src, ScanEngine::Bytes).unwrap();
        assert!(!a.same_filter(&b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn search_without_load_is_not_loaded_error() {
        let cache = FilterCache::new();
        let err = cache.search("utf8:file:nope", "text").unwrap_err();
        assert!(matches!(err, FilterError::NotLoaded { .. }));
    }

    #[test]
    fn failed_load_publishes_nothing() {
        let cache = FilterCache::new();
        let src = DictSource::keywords(["ok", ""]);
        assert!(matches!(cache.load(&src, ScanEngine::Bytes), Err(FilterError::InvalidKeyword { index: 1 })));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().failures, 1);
    }

    #[test]
    fn unload_keeps_outstanding_handles_alive() {
        let cache = FilterCache::new();
        let src = DictSource::keywords(["dog"]);
        let h = cache.load(&src, ScanEngine::Utf8).unwrap();
        assert!(cache.unload(h.key()));
        assert!(!cache.unload(h.key()));
        assert_eq!(h.search_str("hotdog").unwrap(), Some(Match { offset: 3, length: 3 }));
        assert!(cache.search(h.key(), "hotdog").is_err());
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let cache = Arc::new(FilterCache::new());
        let src = DictSource::keywords((0..2000).map(|i| format!("kw{i}")));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let src = src.clone();
                std::thread::spawn(move || cache.load(&src, ScanEngine::Bytes).unwrap())
            })
            .collect();
        let results: Vec<FilterHandle> = handles.into_iter().map(|t| t.join().unwrap()).collect();
        for r in &results[1..] {
            assert!(results[0].same_filter(r));
        }
        let stats = cache.stats();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits, 7);
    }
}
