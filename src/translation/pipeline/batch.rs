//! 批次准备与统计
//!
//! 会话从待翻译队列认领一批元素后，先用缓存命中的译文直接插入，
//! 剩下的文本才发往翻译接口。这里只负责拆分与计数，异步调度在会话中完成。

use markup5ever_rcdom::Handle;

use crate::parsers::html::text_content;
use crate::translation::error::{ErrorCategory, TranslationError};
use crate::translation::pipeline::markers::{is_completed, NodeSet};
use crate::translation::storage::TranslationCache;

/// 一个批次拆分后的结果
#[derive(Debug, Default)]
pub struct BatchPlan {
    /// 缓存命中，可直接插入
    pub cached: Vec<(Handle, String)>,
    /// 需要远程翻译的元素
    pub nodes: Vec<Handle>,
    /// 与 `nodes` 一一对应的修剪文本
    pub texts: Vec<String>,
}

impl BatchPlan {
    /// 按缓存拆分批次，已处理或已完成的元素被丢弃
    pub fn prepare(batch: &[Handle], cache: &mut TranslationCache, processed: &NodeSet) -> Self {
        let mut plan = BatchPlan::default();

        for node in batch {
            if processed.contains(node) || is_completed(node) {
                continue;
            }

            let text = text_content(node).trim().to_string();
            match cache.get(&text) {
                Some(translated) => plan.cached.push((node.clone(), translated)),
                None => {
                    plan.nodes.push(node.clone());
                    plan.texts.push(text);
                }
            }
        }

        plan
    }

    pub fn needs_remote(&self) -> bool {
        !self.texts.is_empty()
    }
}

/// 并行度限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub batch_size: usize,
    pub max_parallel: usize,
}

impl BatchLimits {
    pub fn can_dispatch(&self, active: usize) -> bool {
        active < self.max_parallel
    }
}

/// 批处理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 插入页面的译文数
    pub units_translated: usize,
    /// 由缓存直接提供的译文数
    pub cache_hits: usize,
    pub remote_requests: usize,
    /// 同时进行中的批次数峰值
    pub peak_active: usize,
    /// 失败批次中属于临时故障的次数
    pub retryable_failures: usize,
    pub last_error: Option<ErrorCategory>,
}

impl BatchStats {
    pub fn record_dispatch(&mut self, active: usize) {
        self.dispatched += 1;
        self.peak_active = self.peak_active.max(active);
    }

    pub fn record_failure(&mut self, error: &TranslationError) {
        self.failed += 1;
        if error.is_retryable() {
            self.retryable_failures += 1;
        }
        self.last_error = Some(error.category());
    }

    pub fn success_rate(&self) -> f64 {
        let finished = self.succeeded + self.failed;
        if finished == 0 {
            0.0
        } else {
            self.succeeded as f64 / finished as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{create_element, set_text_content};
    use crate::translation::pipeline::markers::mark_completed;

    fn paragraph(text: &str) -> Handle {
        let node = create_element("p", &[]);
        set_text_content(&node, text);
        node
    }

    #[test]
    fn test_prepare_splits_cache_hits() {
        let a = paragraph("  Cached sentence here.  ");
        let b = paragraph("Fresh sentence to send.");
        let done = paragraph("Already completed text.");
        mark_completed(&done);

        let mut cache = TranslationCache::new();
        cache.insert("Cached sentence here.", "缓存译文");

        let plan = BatchPlan::prepare(
            &[a.clone(), b.clone(), done],
            &mut cache,
            &NodeSet::new(),
        );
        assert_eq!(plan.cached.len(), 1);
        assert_eq!(plan.cached[0].1, "缓存译文");
        assert_eq!(plan.texts, vec!["Fresh sentence to send."]);
        assert!(plan.needs_remote());
    }

    #[test]
    fn test_limits_and_stats() {
        let limits = BatchLimits {
            batch_size: 5,
            max_parallel: 2,
        };
        assert!(limits.can_dispatch(1));
        assert!(!limits.can_dispatch(2));

        let mut stats = BatchStats::default();
        stats.record_dispatch(1);
        stats.record_dispatch(2);
        stats.succeeded = 3;
        stats.failed = 1;
        assert_eq!(stats.peak_active, 2);
        assert_eq!(stats.success_rate(), 0.75);
    }

    #[test]
    fn test_failures_are_classified() {
        let mut stats = BatchStats::default();
        stats.record_failure(&TranslationError::NetworkError("reset".into()));
        stats.record_failure(&TranslationError::ApiError {
            status: 401,
            message: "bad key".into(),
        });

        assert_eq!(stats.failed, 2);
        assert_eq!(stats.retryable_failures, 1);
        assert_eq!(stats.last_error, Some(ErrorCategory::Service));
    }
}
