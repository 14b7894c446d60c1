use std::path::PathBuf;

use trie_filter_core::{load_or_build, DictSource, FilterCache, FilterError, KeywordFilter, Match, ScanEngine};

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let p = dir.path().join(name);
    std::fs::write(&p, content).unwrap();
    p
}

#[test]
fn plain_text_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "words.txt", "# 敏感词\n广告\n垃圾\r\n\n");
    let f = load_or_build(&DictSource::file(&p), ScanEngine::Utf8).unwrap();
    assert_eq!(f.keyword_count(), 2);
    assert_eq!(f.find_first_str("这是垃圾广告").unwrap(), Some(Match { offset: 2, length: 2 }));
}

#[test]
fn toml_dictionary_merges_groups() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(
        &dir,
        "words.toml",
        r#"
keywords = ["spam"]

[[groups]]
name = "ads"
keywords = ["buy now", "free"]

[[groups]]
keywords = ["casino"]
"#,
    );
    let f = load_or_build(&DictSource::file(&p), ScanEngine::Bytes).unwrap();
    assert_eq!(f.keyword_count(), 4);
    assert_eq!(f.find_first_str("get it free").unwrap(), Some(Match { offset: 7, length: 4 }));
}

#[test]
fn toml_with_empty_keyword_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "bad.toml", "keywords = [\"ok\", \"\"]\n");
    let err = load_or_build(&DictSource::file(&p), ScanEngine::Bytes).unwrap_err();
    assert!(matches!(err, FilterError::InvalidKeyword { index: 1 }));
}

#[test]
fn malformed_toml_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "bad.toml", "keywords = [\n");
    let err = load_or_build(&DictSource::file(&p), ScanEngine::Bytes).unwrap_err();
    assert!(matches!(err, FilterError::DictionaryUnavailable { .. }));
}

#[test]
fn empty_file_is_an_empty_dictionary_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "empty.txt", "");
    let f = load_or_build(&DictSource::file(&p), ScanEngine::Bytes).unwrap();
    assert_eq!(f.keyword_count(), 0);
    assert_eq!(f.find_first_str("anything").unwrap(), None);
}

#[test]
fn snapshot_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let built = KeywordFilter::from_keywords(["cat", "catalog", "dog"], ScanEngine::Utf8).unwrap();
    let p = write(&dir, "trie.json", &built.to_snapshot_json().unwrap());

    let loaded = load_or_build(&DictSource::file(&p), ScanEngine::Utf8).unwrap();
    assert_eq!(loaded.node_count(), built.node_count());
    assert_eq!(loaded.find_first_str("a catalog").unwrap(), Some(Match { offset: 2, length: 3 }));

    // 引擎不一致：拒绝
    let err = load_or_build(&DictSource::file(&p), ScanEngine::Bytes).unwrap_err();
    assert!(matches!(err, FilterError::DictionaryUnavailable { .. }));
}

#[test]
fn failed_reload_keeps_previous_handle() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "words.txt", "dog\n");
    let src = DictSource::file(&p);
    let cache = FilterCache::new();

    let old = cache.load(&src, ScanEngine::Utf8).unwrap();
    std::fs::remove_file(&p).unwrap();
    let err = cache.reload(&src, ScanEngine::Utf8).unwrap_err();
    assert!(matches!(err, FilterError::DictionaryUnavailable { .. }));

    assert_eq!(old.search_str("hotdog").unwrap(), Some(Match { offset: 3, length: 3 }));
    let current = cache.get(old.key()).unwrap();
    assert!(current.same_filter(&old));
}

#[test]
fn successful_reload_replaces_entry_but_not_old_handles() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "words.txt", "dog\n");
    let src = DictSource::file(&p);
    let cache = FilterCache::new();

    let old = cache.load(&src, ScanEngine::Utf8).unwrap();
    std::fs::write(&p, "cat\n").unwrap();
    // 普通 load 复用已发布的数据
    assert!(cache.load(&src, ScanEngine::Utf8).unwrap().same_filter(&old));

    let new = cache.reload(&src, ScanEngine::Utf8).unwrap();
    assert!(!new.same_filter(&old));
    assert_eq!(old.search_str("a cat and a dog").unwrap(), Some(Match { offset: 12, length: 3 }));
    assert_eq!(new.search_str("a cat and a dog").unwrap(), Some(Match { offset: 2, length: 3 }));
    assert_eq!(cache.search(new.key(), "cat").unwrap(), Some(Match { offset: 0, length: 3 }));
}

#[test]
fn missing_source_without_prior_handle() {
    let cache = FilterCache::new();
    let src = DictSource::file("/no/such/dictionary.txt");
    let err = cache.load(&src, ScanEngine::Bytes).unwrap_err();
    assert!(matches!(err, FilterError::DictionaryUnavailable { .. }));
    let key = FilterCache::key_of(&src, ScanEngine::Bytes);
    assert!(matches!(cache.search(&key, "text"), Err(FilterError::NotLoaded { .. })));
    assert_eq!(cache.stats().failures, 1);
}

#[test]
fn latin1_dictionary_loads_under_bytes_engine() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("latin1.txt");
    std::fs::write(&p, b"caf\xe9\r\nna\xefve\n").unwrap();
    let src = DictSource::file(&p);

    let f = load_or_build(&src, ScanEngine::Bytes).unwrap();
    assert_eq!(f.keyword_count(), 2);
    assert_eq!(f.find_first_bytes(b"un caf\xe9").unwrap(), Some(Match { offset: 3, length: 4 }));

    // Utf8 引擎仍要求合法 UTF-8
    let err = load_or_build(&src, ScanEngine::Utf8).unwrap_err();
    assert!(matches!(err, FilterError::DictionaryUnavailable { .. }));
}

#[test]
fn equivalent_paths_share_one_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(&dir, "d.txt", "spam\n");
    let dotted = dir.path().join(".").join("d.txt");

    let cache = FilterCache::new();
    let a = cache.load(&DictSource::file(&p), ScanEngine::Utf8).unwrap();
    let b = cache.load(&DictSource::file(&dotted), ScanEngine::Utf8).unwrap();
    assert!(a.same_filter(&b));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().builds, 1);
}
