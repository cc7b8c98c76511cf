//! HTML解析和处理模块
//!
//! - `utils`: 基础常量
//! - `dom`: DOM 读取与修改
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;
pub mod utils;

pub use dom::{
    append_child, closest_with_class, create_element, descendant_elements, detach,
    element_children, get_body, get_child_node_by_name, get_node_attr, get_node_name,
    get_parent_node, has_class, html_to_dom, insert_after, is_connected,
    is_element, set_node_attr, set_text_content, text_content,
};
pub use serializer::serialize_document;
pub use utils::WHITESPACES;
