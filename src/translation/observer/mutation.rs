//! DOM 变化记录
//!
//! 宿主在修改文档后推送 `MutationRecord`，会话经防抖后从中找出需要观察的新元素。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{descendant_elements, is_element};
use crate::translation::observer::visibility::{matches_observable, VisibilityObserver};
use crate::translation::pipeline::markers::{
    is_completed, is_excluded_tag, is_inside_translation, is_scanned, is_translation_artifact,
    NodeSet,
};

/// 一次 DOM 变化
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 新增子节点
    ChildList { added: Vec<Handle> },
    /// 属性变化
    Attributes { target: Handle, attribute: String },
}

impl MutationRecord {
    pub fn added(nodes: Vec<Handle>) -> Self {
        MutationRecord::ChildList { added: nodes }
    }

    pub fn attribute(target: &Handle, attribute: &str) -> Self {
        MutationRecord::Attributes {
            target: target.clone(),
            attribute: attribute.to_string(),
        }
    }
}

/// 元素是否应当加入可见性观察
pub fn should_observe(node: &Handle, observer: &VisibilityObserver) -> bool {
    is_element(node)
        && !is_scanned(node)
        && !is_completed(node)
        && !is_translation_artifact(node)
        && !is_excluded_tag(node)
        && !is_inside_translation(node)
        && !observer.is_registered(node)
        && matches_observable(node)
}

/// 从一组变化记录中收集需要观察的元素，按出现顺序去重
pub fn collect_observable(
    records: &[MutationRecord],
    observer: &VisibilityObserver,
) -> Vec<Handle> {
    let mut found = NodeSet::new();

    for record in records {
        match record {
            MutationRecord::ChildList { added } => {
                for node in added.iter().filter(|n| is_element(n)) {
                    if should_observe(node, observer) {
                        found.insert(node);
                    }
                    for descendant in descendant_elements(node) {
                        if should_observe(&descendant, observer) {
                            found.insert(&descendant);
                        }
                    }
                }
            }
            MutationRecord::Attributes { target, .. } => {
                if should_observe(target, observer) {
                    found.insert(target);
                }
            }
        }
    }

    found.iter().cloned().collect()
}
