//! 待翻译队列
//!
//! 记录已提取但尚未完成翻译的元素及其状态。只有批处理器修改条目状态。

use indexmap::IndexMap;
use markup5ever_rcdom::Handle;

use crate::translation::pipeline::markers::NodeRef;

/// 条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    /// 等待被认领
    Pending,
    /// 已分配到某个进行中的批次
    Processing,
}

/// 按插入顺序排列的待翻译队列
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: IndexMap<NodeRef, PendingStatus>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入队列，已存在（无论状态）时返回 `false`
    pub fn enqueue(&mut self, node: &Handle) -> bool {
        let key = NodeRef::new(node);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, PendingStatus::Pending);
        true
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.entries.contains_key(&NodeRef::new(node))
    }

    pub fn status(&self, node: &Handle) -> Option<PendingStatus> {
        self.entries.get(&NodeRef::new(node)).copied()
    }

    /// 认领至多 `limit` 个等待中的条目并标记为处理中
    pub fn claim(&mut self, limit: usize) -> Vec<Handle> {
        let mut claimed = Vec::new();

        for (node, status) in self.entries.iter_mut() {
            if claimed.len() >= limit {
                break;
            }
            if *status == PendingStatus::Pending {
                *status = PendingStatus::Processing;
                claimed.push(node.handle().clone());
            }
        }

        claimed
    }

    /// 批次成功后移除条目
    pub fn complete(&mut self, nodes: &[Handle]) {
        for node in nodes {
            self.entries.shift_remove(&NodeRef::new(node));
        }
    }

    /// 批次失败后将仍在队列中的条目恢复为等待状态
    pub fn release(&mut self, nodes: &[Handle]) {
        for node in nodes {
            if let Some(status) = self.entries.get_mut(&NodeRef::new(node)) {
                *status = PendingStatus::Pending;
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|status| **status == PendingStatus::Pending)
            .count()
    }

    pub fn processing_count(&self) -> usize {
        self.entries.len() - self.pending_count()
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
}
