//! 页面与后台之间的消息
//!
//! 页面会话不直接访问网络：翻译请求经通道发给后台服务，后台调用翻译接口链后
//! 通过一次性通道回复。消息的 JSON 形式以 `action` 字段区分。

use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, error};

use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::gateway::TranslationGateway;
use crate::translation::settings::SettingsPatch;

/// 宿主消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// 翻译一组文本
    Translate {
        texts: Vec<String>,
        source: String,
        target: String,
    },
    /// 更新设置
    UpdateSettings { settings: SettingsPatch },
    /// 清除全部译文并重新翻译
    TranslatePage,
}

/// 翻译请求的回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslateReply {
    Translations { translations: Vec<String> },
    Error { error: String },
}

impl TranslateReply {
    pub fn from_result(result: TranslationResult<Vec<String>>) -> Self {
        match result {
            Ok(translations) => TranslateReply::Translations { translations },
            Err(e) => TranslateReply::Error {
                error: e.to_string(),
            },
        }
    }

    pub fn into_result(self) -> TranslationResult<Vec<String>> {
        match self {
            TranslateReply::Translations { translations } => Ok(translations),
            TranslateReply::Error { error } => Err(TranslationError::TransportError(error)),
        }
    }
}

/// 通道中传递的翻译请求
pub struct TranslateEnvelope {
    pub texts: Vec<String>,
    pub source: String,
    pub target: String,
    pub reply: oneshot::Sender<TranslateReply>,
}

/// 后台服务
///
/// 持有翻译接口链，同时进行的远程请求数不超过上限。
pub struct BackgroundService {
    gateway: Box<dyn TranslationGateway>,
    permits: Semaphore,
}

impl BackgroundService {
    pub fn new(gateway: Box<dyn TranslationGateway>, max_parallel_requests: usize) -> Self {
        Self {
            gateway,
            permits: Semaphore::new(max_parallel_requests.max(1)),
        }
    }

    /// 处理一个翻译请求
    pub async fn handle_translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslateReply {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return TranslateReply::Error {
                    error: format!("后台服务已关闭: {}", e),
                }
            }
        };

        debug!("后台翻译 {} 段文本", texts.len());
        let result = self.gateway.translate(texts, source, target).await;
        if let Err(e) = &result {
            error!("翻译错误: {}", e);
        }
        TranslateReply::from_result(result)
    }

    pub fn set_model(&self, model: &str) {
        self.gateway.set_model(model);
    }

    /// 启动请求循环，返回页面侧使用的接口
    ///
    /// 必须在 `LocalSet` 内调用。
    pub fn spawn(self: Rc<Self>) -> BridgeGateway {
        let (sender, mut receiver) = mpsc::unbounded_channel::<TranslateEnvelope>();

        tokio::task::spawn_local(async move {
            while let Some(envelope) = receiver.recv().await {
                let service = Rc::clone(&self);
                tokio::task::spawn_local(async move {
                    let reply = service
                        .handle_translate(&envelope.texts, &envelope.source, &envelope.target)
                        .await;
                    // 页面可能已不再等待
                    let _ = envelope.reply.send(reply);
                });
            }
            debug!("后台请求通道已关闭");
        });

        BridgeGateway { sender }
    }
}

/// 页面侧的翻译接口，把请求转发给后台服务
#[derive(Clone)]
pub struct BridgeGateway {
    sender: mpsc::UnboundedSender<TranslateEnvelope>,
}

#[async_trait(?Send)]
impl TranslationGateway for BridgeGateway {
    fn name(&self) -> &str {
        "background"
    }

    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(TranslateEnvelope {
                texts: texts.to_vec(),
                source: source.to_string(),
                target: target.to_string(),
                reply,
            })
            .map_err(|_| TranslationError::TransportError("后台服务不可用".to_string()))?;

        response
            .await
            .map_err(|_| TranslationError::TransportError("后台未响应".to_string()))?
            .into_result()
    }
}
