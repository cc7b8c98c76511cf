use std::cell::RefCell;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use super::utils::WHITESPACES;

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RcDom {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.to_string(),
        None => String::from_utf8_lossy(data).to_string(),
    };

    parse_document(RcDom::default(), Default::default()).one(s.as_str())
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取文档的 body 元素
pub fn get_body(dom: &RcDom) -> Option<Handle> {
    get_child_node_by_name(&dom.document, "html")
        .and_then(|html| get_child_node_by_name(&html, "body"))
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 判断是否为元素节点
pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// 获取父节点
///
/// `parent` 是 `Cell`，读取时必须放回原值
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`None` 表示删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 检查元素的 class 列表是否包含指定类名
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split(WHITESPACES).any(|c| c == class_name))
        .unwrap_or(false)
}

/// 相当于 `element.closest('.class')`，包含节点自身
pub fn closest_with_class(node: &Handle, class_name: &str) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if is_element(&candidate) && has_class(&candidate, class_name) {
            return Some(candidate);
        }
        current = get_parent_node(&candidate);
    }
    None
}

/// 节点是否仍挂在文档树上
pub fn is_connected(node: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if let NodeData::Document = current.data {
            return true;
        }
        match get_parent_node(&current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// 收集节点下所有文本，等价于 DOM 的 `textContent`
pub fn text_content(node: &Handle) -> String {
    let mut buf = String::new();
    collect_text(node, &mut buf);
    buf
}

fn collect_text(node: &Handle, buf: &mut String) {
    match &node.data {
        NodeData::Text { contents } => buf.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document => {
            for child in node.children.borrow().iter() {
                collect_text(child, buf);
            }
        }
        _ => {}
    }
}

/// 直接子元素
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

/// 按文档顺序收集 `root` 之下（不含自身）的全部元素
pub fn descendant_elements(root: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();

    while let Some(node) = stack.pop() {
        if is_element(&node) {
            found.push(node.clone());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    found
}

/// 创建一个游离的元素节点
pub fn create_element(tag_name: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: StrTendril::from_slice(value),
        })
        .collect();

    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag_name)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// 用单个文本节点替换元素的全部子节点
pub fn set_text_content(node: &Handle, text: &str) {
    for child in node.children.borrow_mut().drain(..) {
        child.parent.set(None);
    }

    let text_node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    append_child(node, text_node);
}

/// 追加子节点
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 将 `new_node` 插入为 `reference` 的下一个兄弟节点
///
/// `reference` 没有父节点时返回 `false`
pub fn insert_after(reference: &Handle, new_node: Handle) -> bool {
    let parent = match get_parent_node(reference) {
        Some(parent) => parent,
        None => return false,
    };

    let mut children = parent.children.borrow_mut();
    let index = match children.iter().position(|c| Rc::ptr_eq(c, reference)) {
        Some(index) => index,
        None => return false,
    };

    new_node.parent.set(Some(Rc::downgrade(&parent)));
    children.insert(index + 1, new_node);
    true
}

/// 从父节点中移除
pub fn detach(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(html: &str) -> (RcDom, Handle) {
        let dom = html_to_dom(html.as_bytes(), "");
        let body = get_body(&dom).expect("body");
        (dom, body)
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let (_dom, body) = body_of("<p>Hello <b>brave</b> world</p>");
        assert_eq!(text_content(&body), "Hello brave world");
    }

    #[test]
    fn test_parent_lookup_is_repeatable() {
        let (_dom, body) = body_of("<div><p>text</p></div>");
        let p = descendant_elements(&body)
            .into_iter()
            .find(|n| get_node_name(n) == Some("p"))
            .unwrap();
        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(is_connected(&p));
    }

    #[test]
    fn test_insert_after_and_detach() {
        let (_dom, body) = body_of("<p id=a>one</p><p id=b>two</p>");
        let a = element_children(&body).remove(0);
        let inserted = create_element("p", &[("class", "translation-wrapper")]);
        set_text_content(&inserted, "一");

        assert!(insert_after(&a, inserted.clone()));
        let names: Vec<String> = element_children(&body)
            .iter()
            .map(|n| get_node_attr(n, "id").unwrap_or_else(|| "new".to_string()))
            .collect();
        assert_eq!(names, vec!["a", "new", "b"]);
        assert!(is_connected(&inserted));

        detach(&inserted);
        assert!(!is_connected(&inserted));
        assert_eq!(element_children(&body).len(), 2);
    }

    #[test]
    fn test_class_helpers() {
        let (_dom, body) = body_of(r#"<div class="x translation-wrapper"><span>in</span></div>"#);
        let span = descendant_elements(&body)
            .into_iter()
            .find(|n| get_node_name(n) == Some("span"))
            .unwrap();
        assert!(!has_class(&span, "translation-wrapper"));
        assert!(closest_with_class(&span, "translation-wrapper").is_some());
    }

    #[test]
    fn test_set_node_attr_add_replace_remove() {
        let (_dom, body) = body_of("<p>text</p>");
        let p = element_children(&body).remove(0);
        set_node_attr(&p, "data-translation-scanned", Some("true".to_string()));
        assert_eq!(get_node_attr(&p, "data-translation-scanned").as_deref(), Some("true"));
        set_node_attr(&p, "data-translation-scanned", Some("false".to_string()));
        assert_eq!(get_node_attr(&p, "data-translation-scanned").as_deref(), Some("false"));
        set_node_attr(&p, "data-translation-scanned", None);
        assert_eq!(get_node_attr(&p, "data-translation-scanned"), None);
    }
}
