//! 可见性观察器
//!
//! 维护被观察的元素集合。每次视口变化时，找出与扩展后的视口相交比例达到阈值的元素，
//! 取消对它们的观察并交给会话扫描。

use markup5ever_rcdom::Handle;

use crate::parsers::html::{element_children, get_node_name, get_parent_node, has_class};
use crate::translation::config::{constants, ObserverConfig};
use crate::translation::observer::layout::{LayoutSource, Viewport};
use crate::translation::pipeline::markers::NodeSet;

/// 元素是否匹配可观察选择器
///
/// `p`、`h1`–`h6`、父元素为 `div` 且不是译文文本的 `span`、没有直接 `ul`/`ol` 子元素的 `li`。
pub fn matches_observable(node: &Handle) -> bool {
    let Some(name) = get_node_name(node) else {
        return false;
    };

    if constants::OBSERVABLE_TAGS.contains(&name) {
        return true;
    }

    match name {
        "span" => {
            !has_class(node, constants::TRANSLATION_TEXT_CLASS)
                && get_parent_node(node)
                    .map(|parent| get_node_name(&parent) == Some("div"))
                    .unwrap_or(false)
        }
        "li" => !element_children(node)
            .iter()
            .any(|child| matches!(get_node_name(child), Some("ul") | Some("ol"))),
        _ => false,
    }
}

#[derive(Debug)]
pub struct VisibilityObserver {
    /// 当前被观察的元素
    targets: NodeSet,
    /// 曾经注册过的元素，避免重复注册
    registered: NodeSet,
    threshold: f64,
    root_margin: f64,
}

impl VisibilityObserver {
    pub fn new(config: &ObserverConfig) -> Self {
        Self {
            targets: NodeSet::new(),
            registered: NodeSet::new(),
            threshold: config.threshold,
            root_margin: config.root_margin_px,
        }
    }

    /// 开始观察，元素已在观察中时返回 `false`
    pub fn observe(&mut self, node: &Handle) -> bool {
        self.registered.insert(node);
        self.targets.insert(node)
    }

    pub fn unobserve(&mut self, node: &Handle) -> bool {
        self.targets.remove(node)
    }

    pub fn is_observed(&self, node: &Handle) -> bool {
        self.targets.contains(node)
    }

    pub fn is_registered(&self, node: &Handle) -> bool {
        self.registered.contains(node)
    }

    pub fn observed_count(&self) -> usize {
        self.targets.len()
    }

    /// 取出所有进入扩展视口的元素，并停止观察它们
    pub fn take_intersecting(
        &mut self,
        viewport: &Viewport,
        layout: &dyn LayoutSource,
    ) -> Vec<Handle> {
        let root = viewport.rect().expand(self.root_margin);

        let visible: Vec<Handle> = self
            .targets
            .iter()
            .filter(|node| {
                layout
                    .bounding_rect(node)
                    .map(|rect| {
                        rect.intersects(&root) && rect.intersection_ratio(&root) >= self.threshold
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        for node in &visible {
            self.targets.remove(node);
        }

        visible
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.registered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{descendant_elements, get_body, html_to_dom};
    use crate::translation::observer::layout::Rect;
    use crate::translation::pipeline::markers::NodeRef;
    use std::collections::HashMap;

    struct Fixed(HashMap<NodeRef, Rect>);

    impl LayoutSource for Fixed {
        fn bounding_rect(&self, node: &Handle) -> Option<Rect> {
            self.0.get(&NodeRef::new(node)).copied()
        }
    }

    fn elements(html: &str) -> Vec<Handle> {
        let dom = html_to_dom(html.as_bytes(), "");
        descendant_elements(&get_body(&dom).unwrap())
    }

    fn by_name(nodes: &[Handle], name: &str) -> Vec<Handle> {
        nodes
            .iter()
            .filter(|n| get_node_name(n) == Some(name))
            .cloned()
            .collect()
    }

    #[test]
    fn test_observable_selector() {
        let nodes = elements(
            "<div><span>a</span><span class=\"translation-text\">b</span></div>\
             <p><span>c</span></p>\
             <ul><li>plain</li><li>nested<ul><li>inner</li></ul></li></ul><h3>h</h3><section>s</section>",
        );
        let spans = by_name(&nodes, "span");
        assert!(matches_observable(&spans[0]));
        assert!(!matches_observable(&spans[1]));
        assert!(!matches_observable(&spans[2]));

        let lis = by_name(&nodes, "li");
        assert!(matches_observable(&lis[0]));
        assert!(!matches_observable(&lis[1]));
        assert!(matches_observable(&lis[2]));

        assert!(matches_observable(&by_name(&nodes, "h3")[0]));
        assert!(!matches_observable(&by_name(&nodes, "section")[0]));
    }

    #[test]
    fn test_take_intersecting_uses_margin_and_threshold() {
        let nodes = elements("<p>near</p><p>far</p><p>edge</p>");
        let ps = by_name(&nodes, "p");
        let mut rects = HashMap::new();
        // 视口 0..600，扩展 300 后为 -300..900
        rects.insert(NodeRef::new(&ps[0]), Rect::new(0.0, 800.0, 100.0, 50.0));
        rects.insert(NodeRef::new(&ps[1]), Rect::new(0.0, 2000.0, 100.0, 50.0));
        // 只有 5% 落在扩展区域内
        rects.insert(NodeRef::new(&ps[2]), Rect::new(0.0, 895.0, 100.0, 100.0));
        let layout = Fixed(rects);

        let mut observer = VisibilityObserver::new(&ObserverConfig::default());
        for p in &ps {
            observer.observe(p);
        }

        let visible = observer.take_intersecting(&Viewport::new(0.0, 800.0, 600.0), &layout);
        assert_eq!(visible.len(), 1);
        assert!(std::rc::Rc::ptr_eq(&visible[0], &ps[0]));
        assert!(!observer.is_observed(&ps[0]));
        assert!(observer.is_registered(&ps[0]));
        assert_eq!(observer.observed_count(), 2);

        let visible = observer.take_intersecting(&Viewport::new(1500.0, 800.0, 600.0), &layout);
        assert_eq!(visible.len(), 1);
        assert!(std::rc::Rc::ptr_eq(&visible[0], &ps[1]));
    }
}
