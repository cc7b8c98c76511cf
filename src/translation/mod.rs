//! 翻译模块
//!
//! 页面内联翻译的完整流程：
//! - **pipeline**: 文本分类、段落提取、待翻译队列
//! - **observer**: 可见性与 DOM 变化观察
//! - **gateway**: 远程翻译接口
//! - **session**: 单个页面的翻译会话
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use inline_translator::html_to_dom;
//! use inline_translator::translation::{ConfigManager, Extension, FlowLayout, Viewport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let local = tokio::task::LocalSet::new();
//! local
//!     .run_until(async {
//!         let dom = html_to_dom(b"<p>Hello world, this is a test.</p>", "");
//!         let manager = ConfigManager::new()?;
//!         let extension =
//!             Extension::from_config(dom.document.clone(), manager.config(), Box::new(FlowLayout::default()))?;
//!
//!         extension.start();
//!         extension.session().on_viewport_change(Viewport::new(0.0, 800.0, 600.0));
//!         extension.session().wait_idle(std::time::Duration::from_secs(30)).await;
//!         Ok::<_, Box<dyn std::error::Error>>(())
//!     })
//!     .await
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 错误处理模块
pub mod error;

/// 宿主入口与消息分派
pub mod extension;

/// 远程翻译接口
pub mod gateway;

/// 译文插入
pub mod inserter;

/// 页面与后台之间的消息
pub mod messaging;

/// 可见性与 DOM 变化观察
pub mod observer;

/// 文本处理管道
pub mod pipeline;

/// 页面翻译会话
pub mod session;

/// 用户设置
pub mod settings;

/// 翻译缓存
pub mod storage;

// ============================================================================
// 公共API导出
// ============================================================================

pub use config::{ConfigManager, GatewayConfig, ObserverConfig, PipelineConfig, TranslatorConfig};
pub use error::{ErrorCategory, TranslationError, TranslationResult};
pub use extension::Extension;
pub use gateway::{FallbackGateway, MyMemoryGateway, OpenAiGateway, TranslationGateway};
pub use inserter::{InlineStyleSource, StyleSource, TranslationInserter};
pub use messaging::{BackgroundService, BridgeGateway, Message, TranslateReply};
pub use observer::{FlowLayout, LayoutSource, MutationRecord, Rect, Viewport};
pub use pipeline::{ParagraphExtractor, PendingQueue, TextFilter};
pub use session::{PageSession, SessionStats};
pub use settings::{Settings, SettingsPatch, SettingsStore};
pub use storage::TranslationCache;
