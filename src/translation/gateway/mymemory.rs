//! 备用翻译接口：逐条 GET 请求

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::translation::config::GatewayConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::gateway::TranslationGateway;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_status: serde_json::Value,
    #[serde(default)]
    response_data: Option<MyMemoryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: String,
}

impl MyMemoryResponse {
    // 状态码有时是数字有时是字符串
    fn is_ok(&self) -> bool {
        self.response_status.as_u64() == Some(200) || self.response_status.as_str() == Some("200")
    }
}

pub struct MyMemoryGateway {
    client: Client,
    url: String,
}

impl MyMemoryGateway {
    pub fn new(config: &GatewayConfig) -> TranslationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            client,
            url: config.fallback_url.clone(),
        })
    }

    async fn translate_one(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> TranslationResult<String> {
        let langpair = format!("{}|{}", source, target);
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误信息".to_string());
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MyMemoryResponse = response.json().await?;
        if !parsed.is_ok() {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: format!("备用翻译失败，返回状态: {}", parsed.response_status),
            });
        }

        parsed
            .response_data
            .map(|data| data.translated_text)
            .ok_or_else(|| TranslationError::InvalidResponse("缺少 responseData".to_string()))
    }
}

#[async_trait(?Send)]
impl TranslationGateway for MyMemoryGateway {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.translate_one(text, source, target).await?);
        }
        Ok(results)
    }
}
