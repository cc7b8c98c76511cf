//! 观察器
//!
//! - `layout`: 视口和元素几何信息
//! - `visibility`: 元素进入视口的检测
//! - `mutation`: DOM 变化记录
//! - `debounce`: 变化事件防抖

pub mod debounce;
pub mod layout;
pub mod mutation;
pub mod visibility;

pub use debounce::Debouncer;
pub use layout::{FlowLayout, LayoutSource, Rect, Viewport};
pub use mutation::{collect_observable, should_observe, MutationRecord};
pub use visibility::{matches_observable, VisibilityObserver};
