//! 翻译管道模块
//!
//! 文本分类、段落提取、节点标记、待翻译队列与批次准备。

pub mod batch;
pub mod collector;
pub mod filters;
pub mod markers;
pub mod queue;

pub use batch::{BatchLimits, BatchPlan, BatchStats};
pub use collector::ParagraphExtractor;
pub use filters::{is_english_content, is_translation_candidate, TextFilter};
pub use markers::{NodeRef, NodeSet};
pub use queue::{PendingQueue, PendingStatus};
