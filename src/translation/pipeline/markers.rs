//! 节点标记
//!
//! 已处理集合保存在会话中，扫描/完成状态写在元素的 `data-*` 属性上，
//! 与浏览器中的 `dataset` 一致，序列化后仍可见。

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexSet;
use markup5ever_rcdom::Handle;

use crate::parsers::html::{
    closest_with_class, get_node_attr, get_node_name, has_class, set_node_attr,
};
use crate::translation::config::constants;

/// 按节点身份比较的句柄
///
/// 集合持有强引用，节点在集合中期间地址不会被复用。
#[derive(Clone, Debug)]
pub struct NodeRef(pub Handle);

impl NodeRef {
    pub fn new(handle: &Handle) -> Self {
        Self(handle.clone())
    }

    pub fn handle(&self) -> &Handle {
        &self.0
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

/// 保持插入顺序的节点集合
#[derive(Debug, Default)]
pub struct NodeSet {
    nodes: IndexSet<NodeRef>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入集合，已存在时返回 `false`
    pub fn insert(&mut self, node: &Handle) -> bool {
        self.nodes.insert(NodeRef::new(node))
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.nodes.contains(&NodeRef::new(node))
    }

    pub fn remove(&mut self, node: &Handle) -> bool {
        self.nodes.shift_remove(&NodeRef::new(node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.nodes.iter().map(NodeRef::handle)
    }
}

fn flag_is_set(node: &Handle, attr: &str) -> bool {
    get_node_attr(node, attr).as_deref() == Some("true")
}

/// 元素是否已扫描
pub fn is_scanned(node: &Handle) -> bool {
    flag_is_set(node, constants::ATTR_SCANNED)
}

/// 元素的翻译是否已完成
pub fn is_completed(node: &Handle) -> bool {
    flag_is_set(node, constants::ATTR_COMPLETED)
}

pub fn mark_scanned(node: &Handle) {
    set_node_attr(node, constants::ATTR_SCANNED, Some("true".to_string()));
}

pub fn mark_completed(node: &Handle) {
    set_node_attr(node, constants::ATTR_COMPLETED, Some("true".to_string()));
}

/// 清除节点上的全部翻译标记
pub fn clear_marks(node: &Handle) {
    set_node_attr(node, constants::ATTR_SCANNED, None);
    set_node_attr(node, constants::ATTR_COMPLETED, None);
    set_node_attr(node, constants::ATTR_TRANSLATION_ID, None);
}

/// 元素本身是否为译文产物
pub fn is_translation_artifact(node: &Handle) -> bool {
    has_class(node, constants::TRANSLATION_WRAPPER_CLASS)
        || has_class(node, constants::TRANSLATION_TEXT_CLASS)
}

/// 元素本身或其祖先是否为译文容器
pub fn is_inside_translation(node: &Handle) -> bool {
    closest_with_class(node, constants::TRANSLATION_WRAPPER_CLASS).is_some()
}

/// 标签是否在排除列表中
pub fn is_excluded_tag(node: &Handle) -> bool {
    get_node_name(node)
        .map(|name| {
            constants::EXCLUDE_TAGS
                .iter()
                .any(|tag| name.eq_ignore_ascii_case(tag))
        })
        .unwrap_or(false)
}
