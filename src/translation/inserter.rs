//! 译文插入
//!
//! 在原文元素之后插入一个同名标签的兄弟元素，复制原文的主要文字样式。

use std::cell::Cell;

use markup5ever_rcdom::Handle;

use crate::parsers::css::parse_inline_style;
use crate::parsers::html::{
    create_element, get_node_attr, get_node_name, get_parent_node, insert_after, set_node_attr,
    set_text_content,
};
use crate::translation::config::constants;
use crate::translation::pipeline::markers::{mark_completed, NodeSet};

/// 会沿祖先继承的样式属性
const INHERITED_PROPERTIES: &[&str] = &[
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "color",
    "line-height",
    "text-align",
];

/// 计算样式来源
pub trait StyleSource {
    /// 元素某个属性的计算值，未知时返回 `None`
    fn computed_style(&self, node: &Handle, property: &str) -> Option<String>;
}

/// 根据 `style` 属性推算计算样式
///
/// 可继承属性向上查找最近的声明，`margin`、`padding` 只看元素自身。
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineStyleSource;

impl InlineStyleSource {
    fn declared(node: &Handle, property: &str) -> Option<String> {
        let style = get_node_attr(node, "style")?;
        parse_inline_style(&style)
            .into_iter()
            .rev()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }
}

impl StyleSource for InlineStyleSource {
    fn computed_style(&self, node: &Handle, property: &str) -> Option<String> {
        if !INHERITED_PROPERTIES.contains(&property) {
            return Self::declared(node, property);
        }

        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if let Some(value) = Self::declared(&candidate, property) {
                return Some(value);
            }
            current = get_parent_node(&candidate);
        }
        None
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 译文插入器
pub struct TranslationInserter {
    style_source: Box<dyn StyleSource>,
    counter: Cell<u64>,
}

impl TranslationInserter {
    pub fn new(style_source: Box<dyn StyleSource>) -> Self {
        Self {
            style_source,
            counter: Cell::new(0),
        }
    }

    /// 生成 `trans-<毫秒时间戳>-<9 位 base36>` 形式的标识
    pub fn next_translation_id(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let sequence = self.counter.get();
        self.counter.set(sequence.wrapping_add(1));

        let mut hasher = blake3::Hasher::new();
        hasher.update(&millis.to_le_bytes());
        hasher.update(&sequence.to_le_bytes());
        let hash = hasher.finalize();

        let suffix: String = hash.as_bytes()[..9]
            .iter()
            .map(|byte| BASE36[(*byte % 36) as usize] as char)
            .collect();

        format!("trans-{}-{}", millis, suffix)
    }

    /// 从原文元素复制样式，拼成 `style` 属性值
    pub fn copied_style(&self, node: &Handle) -> String {
        constants::STYLES_TO_COPY
            .iter()
            .filter_map(|property| {
                self.style_source
                    .computed_style(node, property)
                    .map(|value| format!("{}: {}", property, value))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 在 `node` 之后插入译文
    ///
    /// 原文没有父节点或已处理时什么也不做，返回 `None`。成功时原文与译文元素
    /// 都加入 `processed`，原文标记为已完成。
    pub fn insert(
        &self,
        node: &Handle,
        translated: &str,
        processed: &mut NodeSet,
    ) -> Option<Handle> {
        if processed.contains(node) || get_parent_node(node).is_none() {
            return None;
        }

        let tag = get_node_name(node)?;
        let translation_id = self.next_translation_id();
        let element = create_element(
            tag,
            &[
                ("class", constants::TRANSLATION_WRAPPER_CLASS),
                (constants::ATTR_TRANSLATION_ID, translation_id.as_str()),
            ],
        );
        set_text_content(&element, translated);

        let style = self.copied_style(node);
        if !style.is_empty() {
            set_node_attr(&element, "style", Some(style));
        }

        if !insert_after(node, element.clone()) {
            return None;
        }

        processed.insert(&element);
        processed.insert(node);
        mark_completed(node);

        Some(element)
    }
}

impl Default for TranslationInserter {
    fn default() -> Self {
        Self::new(Box::new(InlineStyleSource))
    }
}
