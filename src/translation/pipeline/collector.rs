//! 段落提取模块
//!
//! 在 DOM 子树中寻找最小可翻译单元。采用“最大合格祖先”规则：
//! 某个元素的完整文本合格时整个元素就是一个单元，不再向下递归，
//! 因此返回的节点之间不存在祖先/后代关系。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{is_element, text_content};
use crate::translation::pipeline::filters::TextFilter;
use crate::translation::pipeline::markers::{
    is_completed, is_excluded_tag, is_inside_translation, is_translation_artifact, NodeSet,
};

/// 段落提取器
pub struct ParagraphExtractor<'a> {
    filter: &'a TextFilter,
    processed: &'a NodeSet,
}

impl<'a> ParagraphExtractor<'a> {
    pub fn new(filter: &'a TextFilter, processed: &'a NodeSet) -> Self {
        Self { filter, processed }
    }

    /// 返回 `root` 子树中的翻译单元，按文档顺序
    pub fn extract(&self, root: &Handle) -> Vec<Handle> {
        let mut found = Vec::new();
        self.collect(root, &mut found);
        found
    }

    fn collect(&self, node: &Handle, found: &mut Vec<Handle>) {
        // 文本、注释等非元素节点不直接处理
        if !is_element(node) {
            return;
        }

        if self.processed.contains(node) || is_completed(node) {
            return;
        }

        if is_excluded_tag(node) || is_translation_artifact(node) || is_inside_translation(node) {
            return;
        }

        let text = text_content(node);
        if self.filter.should_translate(&text) {
            found.push(node.clone());
            return;
        }

        let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        for child in &children {
            self.collect(child, found);
        }
    }
}
