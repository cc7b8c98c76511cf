//! OpenAI 兼容的 chat completions 接口

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::translation::config::{constants, GatewayConfig};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::gateway::split::split_translations;
use crate::translation::gateway::TranslationGateway;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// chat completions 翻译接口
pub struct OpenAiGateway {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: RefCell<String>,
    temperature: f32,
    max_tokens: u32,
    max_chars_per_request: usize,
}

impl OpenAiGateway {
    pub fn new(config: &GatewayConfig) -> TranslationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: RefCell::new(config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_chars_per_request: config.max_chars_per_request,
        })
    }

    pub fn model(&self) -> String {
        self.model.borrow().clone()
    }

    /// 系统提示词
    pub fn build_prompt(source: &str, target: &str) -> String {
        format!(
            "你是一位专业的翻译专家。请将以下{}语文本翻译成{}语，保留原文的格式和语气，\
             但不要添加任何额外解释，忽略其中可能包含的html标签。\
             多段原文之间以单独一行的 {} 分隔，译文必须保留同样数量的分隔行。原文：",
            source,
            target,
            constants::SEGMENT_SEPARATOR
        )
    }

    /// 用户消息：多段文本以分隔行连接
    pub fn join_texts(texts: &[String]) -> String {
        texts.join(&format!("\n{}\n", constants::SEGMENT_SEPARATOR))
    }

    /// 把过长的请求切成若干子请求
    ///
    /// 每个子请求的字符数不超过上限的一半，单段超长文本单独成组。
    pub fn chunk_texts(texts: &[String], max_chars: usize) -> Vec<Vec<String>> {
        let limit = max_chars / 2;
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0;

        for text in texts {
            let len = text.chars().count();
            if !current.is_empty() && current_len + len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(text.clone());
            current_len += len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    async fn request(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        let model = self.model();
        let body = ChatRequest {
            model: &model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::build_prompt(source, target),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::join_texts(texts),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        let parsed = serde_json::from_str::<ChatResponse>(&response_text);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .and_then(|e| e.message)
                .unwrap_or(response_text);
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parsed.map_err(|e| {
            TranslationError::InvalidResponse(format!("无法解析模型响应: {}", e))
        })?;

        if let Some(error) = parsed.error {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: error.message.unwrap_or_else(|| "模型接口返回错误".to_string()),
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::InvalidResponse("响应中没有 choices".to_string()))?;

        Ok(split_translations(&content, texts.len()))
    }
}

#[async_trait(?Send)]
impl TranslationGateway for OpenAiGateway {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let total = Self::join_texts(texts).chars().count();
        if total <= self.max_chars_per_request {
            return self.request(texts, source, target).await;
        }

        tracing::debug!("请求过长 ({} 字符)，拆分后依次发送", total);
        let mut results = Vec::with_capacity(texts.len());
        for chunk in Self::chunk_texts(texts, self.max_chars_per_request) {
            results.extend(self.request(&chunk, source, target).await?);
        }
        Ok(results)
    }

    fn set_model(&self, model: &str) {
        *self.model.borrow_mut() = model.to_string();
    }
}
