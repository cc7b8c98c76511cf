//! 远程翻译接口
//!
//! 核心流程只依赖 `TranslationGateway`：一组文本加源/目标语言，返回等长的译文列表或失败。
//! 主接口是 OpenAI 兼容的 chat completions，失败后改用逐条请求的备用接口。

use std::rc::Rc;

use async_trait::async_trait;

use crate::translation::config::GatewayConfig;
use crate::translation::error::TranslationResult;

pub mod chain;
pub mod mymemory;
pub mod openai;
pub mod split;

pub use chain::FallbackGateway;
pub use mymemory::MyMemoryGateway;
pub use openai::OpenAiGateway;
pub use split::{smart_split, split_translations};

/// 翻译接口
///
/// 运行在单线程事件循环上，不要求 `Send`。
#[async_trait(?Send)]
pub trait TranslationGateway {
    /// 用于日志的名称
    fn name(&self) -> &str;

    /// 翻译一组文本，第 N 个输出对应第 N 个输入
    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>>;

    /// 切换模型，不支持模型选择的接口忽略
    fn set_model(&self, _model: &str) {}
}

#[async_trait(?Send)]
impl<G: TranslationGateway + ?Sized> TranslationGateway for Rc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        (**self).translate(texts, source, target).await
    }

    fn set_model(&self, model: &str) {
        (**self).set_model(model)
    }
}

/// 按配置组装主接口与备用接口
pub fn build_gateway_chain(config: &GatewayConfig) -> TranslationResult<FallbackGateway> {
    let primary = OpenAiGateway::new(config)?;

    let secondary: Option<Box<dyn TranslationGateway>> = if config.fallback_url.is_empty() {
        None
    } else {
        Some(Box::new(MyMemoryGateway::new(config)?))
    };

    Ok(FallbackGateway::new(Box::new(primary), secondary))
}
