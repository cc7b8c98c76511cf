//! 视口与元素几何信息
//!
//! 浏览器之外没有真实布局，几何信息由 `LayoutSource` 提供。命令行使用
//! `FlowLayout` 按文档顺序粗略估算每个块的位置。

use std::collections::HashMap;

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::get_node_name;
use crate::translation::pipeline::markers::NodeRef;

/// 文档坐标系中的矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// 四边各向外扩展 `margin`
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// 是否相交，边缘接触也算
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// 与 `root` 相交部分占自身面积的比例
    pub fn intersection_ratio(&self, root: &Rect) -> f64 {
        if !self.intersects(root) {
            return 0.0;
        }
        let area = self.area();
        if area <= 0.0 {
            return 1.0;
        }
        let width = self.right().min(root.right()) - self.x.max(root.x);
        let height = self.bottom().min(root.bottom()) - self.y.max(root.y);
        (width.max(0.0) * height.max(0.0)) / area
    }
}

/// 当前可见区域
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_y: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

/// 元素几何信息来源
pub trait LayoutSource {
    /// 文档变化后重新计算，默认不做任何事
    fn refresh(&mut self, _document: &Handle) {}

    /// 元素的边界矩形，未参与布局时返回 `None`
    fn bounding_rect(&self, node: &Handle) -> Option<Rect>;
}

/// 不参与布局的元素
const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "title", "meta", "link",
];

/// 按文档顺序堆叠块的估算布局
///
/// 每个元素的直接文本按固定行宽折行，子元素依次排在其后。
#[derive(Debug, Clone)]
pub struct FlowLayout {
    width: f64,
    line_height: f64,
    chars_per_line: usize,
    rects: HashMap<NodeRef, Rect>,
    content_height: f64,
}

impl FlowLayout {
    pub fn new(width: f64, line_height: f64, chars_per_line: usize) -> Self {
        Self {
            width,
            line_height,
            chars_per_line: chars_per_line.max(1),
            rects: HashMap::new(),
            content_height: 0.0,
        }
    }

    /// 整个文档的估算高度
    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    fn direct_text_chars(node: &Handle) -> usize {
        node.children
            .borrow()
            .iter()
            .map(|child| match &child.data {
                NodeData::Text { contents } => contents.borrow().trim().chars().count(),
                _ => 0,
            })
            .sum()
    }

    fn layout_node(&mut self, node: &Handle, top: f64) -> f64 {
        match &node.data {
            NodeData::Document => {
                let mut cursor = top;
                let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
                for child in &children {
                    cursor += self.layout_node(child, cursor);
                }
                cursor - top
            }
            NodeData::Element { .. } => {
                let hidden = get_node_name(node)
                    .map(|name| HIDDEN_TAGS.contains(&name))
                    .unwrap_or(false);
                if hidden {
                    return 0.0;
                }

                let mut cursor = top;
                let chars = Self::direct_text_chars(node);
                if chars > 0 {
                    let lines = chars.div_ceil(self.chars_per_line);
                    cursor += lines as f64 * self.line_height;
                }

                let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
                for child in &children {
                    cursor += self.layout_node(child, cursor);
                }

                let height = cursor - top;
                self.rects
                    .insert(NodeRef::new(node), Rect::new(0.0, top, self.width, height));
                height
            }
            _ => 0.0,
        }
    }
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self::new(800.0, 24.0, 80)
    }
}

impl LayoutSource for FlowLayout {
    fn refresh(&mut self, document: &Handle) {
        self.rects.clear();
        self.content_height = self.layout_node(document, 0.0);
    }

    fn bounding_rect(&self, node: &Handle) -> Option<Rect> {
        self.rects.get(&NodeRef::new(node)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{descendant_elements, html_to_dom};

    #[test]
    fn test_intersection_ratio() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(Rect::new(0.0, 50.0, 100.0, 100.0).intersection_ratio(&root), 0.5);
        assert_eq!(Rect::new(0.0, 200.0, 100.0, 10.0).intersection_ratio(&root), 0.0);
        assert_eq!(Rect::new(10.0, 10.0, 0.0, 0.0).intersection_ratio(&root), 1.0);
    }

    #[test]
    fn test_expand_adds_margin_on_every_side() {
        let rect = Rect::new(0.0, 100.0, 50.0, 50.0).expand(10.0);
        assert_eq!(rect, Rect::new(-10.0, 90.0, 70.0, 70.0));
    }

    #[test]
    fn test_flow_layout_stacks_blocks() {
        let dom = html_to_dom(
            b"<html><head><title>t</title></head><body><p>one</p><p>two</p></body></html>",
            "",
        );
        let mut layout = FlowLayout::new(800.0, 20.0, 80);
        layout.refresh(&dom.document);

        let ps: Vec<Handle> = descendant_elements(&dom.document)
            .into_iter()
            .filter(|n| get_node_name(n) == Some("p"))
            .collect();
        let first = layout.bounding_rect(&ps[0]).unwrap();
        let second = layout.bounding_rect(&ps[1]).unwrap();
        assert_eq!(first.y, 0.0);
        assert_eq!(second.y, 20.0);
        assert_eq!(layout.content_height(), 40.0);
    }

    #[test]
    fn test_long_text_wraps() {
        let html = format!("<p>{}</p>", "a".repeat(170));
        let dom = html_to_dom(html.as_bytes(), "");
        let mut layout = FlowLayout::new(800.0, 10.0, 80);
        layout.refresh(&dom.document);
        let p = descendant_elements(&dom.document)
            .into_iter()
            .find(|n| get_node_name(n) == Some("p"))
            .unwrap();
        assert_eq!(layout.bounding_rect(&p).unwrap().height, 30.0);
    }
}
