//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作、序列化
//! - `css` - 内联样式声明解析

pub mod css;
pub mod html;

pub use css::parse_inline_style;
pub use html::{html_to_dom, serialize_document};
