//! # Inline Translator
//!
//! 在英文网页中逐段插入中文译文：段落进入视口时才翻译，译文紧跟在原文之后。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 读写与内联样式解析
//! - `translation` - 翻译流程
//! - `env` - 环境变量

pub mod env;
pub mod parsers;
pub mod translation;

pub use parsers::{html_to_dom, serialize_document};
