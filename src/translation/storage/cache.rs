//! 翻译缓存
//!
//! 以修剪后的原文为键，页面会话内有效。没有过期也没有容量上限，
//! 页面重置时保留，重新翻译同一页面不会再次请求接口。

use std::collections::HashMap;

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
}

impl CacheStats {
    /// 命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 会话级翻译缓存
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
    stats: CacheStats,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 归一化缓存键
    pub fn normalize(text: &str) -> &str {
        text.trim()
    }

    /// 查询缓存并记录命中情况
    pub fn get(&mut self, text: &str) -> Option<String> {
        match self.entries.get(Self::normalize(text)) {
            Some(translated) => {
                self.stats.hits += 1;
                Some(translated.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// 只检查是否存在，不计入统计
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(Self::normalize(text))
    }

    /// 写入缓存，相同键直接覆盖
    pub fn insert(&mut self, text: &str, translated: &str) {
        self.entries
            .insert(Self::normalize(text).to_string(), translated.to_string());
        self.stats.inserts += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_whitespace() {
        let mut cache = TranslationCache::new();
        cache.insert("  Hello world  ", "你好世界");
        assert_eq!(cache.get("Hello world").as_deref(), Some("你好世界"));
        assert_eq!(cache.get("\nHello world\t").as_deref(), Some("你好世界"));
        assert!(cache.contains("Hello world"));
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut cache = TranslationCache::new();
        cache.insert("Hello", "你好");
        cache.insert("Hello", "您好");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Hello").as_deref(), Some("您好"));
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let mut cache = TranslationCache::new();
        assert!(cache.get("missing").is_none());
        cache.insert("present", "存在");
        assert!(cache.get("present").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
