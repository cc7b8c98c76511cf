//! 翻译配置管理模块
//!
//! 配置来源按优先级从低到高：内置默认值、配置文件、`.env` 与环境变量。

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::env::{self, EnvVar};
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置常量
pub mod constants {
    pub const MIN_TEXT_LENGTH: usize = 10;
    pub const BATCH_SIZE: usize = 5;
    pub const MAX_PARALLEL_BATCHES: usize = 4;
    pub const DRAIN_DELAY_MS: u64 = 10;
    pub const DEBOUNCE_MS: u64 = 150;
    pub const OBSERVER_THRESHOLD: f64 = 0.1;
    pub const OBSERVER_ROOT_MARGIN_PX: f64 = 300.0;
    pub const RESCAN_DELAY_MS: u64 = 5000;
    pub const ENGLISH_RATIO_THRESHOLD: f64 = 0.5;

    pub const EXCLUDE_TAGS: &[&str] = &[
        "script", "style", "code", "pre", "textarea", "input", "noscript", "svg",
    ];

    pub const OBSERVABLE_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

    pub const TRANSLATION_WRAPPER_CLASS: &str = "translation-wrapper";
    pub const TRANSLATION_TEXT_CLASS: &str = "translation-text";

    pub const ATTR_SCANNED: &str = "data-translation-scanned";
    pub const ATTR_COMPLETED: &str = "data-translation-completed";
    pub const ATTR_TRANSLATION_ID: &str = "data-translation-id";

    pub const STYLES_TO_COPY: &[&str] = &[
        "font-family",
        "font-size",
        "font-weight",
        "font-style",
        "color",
        "line-height",
        "text-align",
        "margin",
        "padding",
    ];

    pub const SOURCE_LANG: &str = "en";
    pub const TARGET_LANG: &str = "zh-CN";

    pub const DEFAULT_API_URL: &str = "https://api.lkeap.cloud.tencent.com/v1/chat/completions";
    pub const DEFAULT_FALLBACK_URL: &str = "https://api.mymemory.translated.net/get";
    pub const DEFAULT_MODEL: &str = "deepseek-v3";
    pub const DEFAULT_TEMPERATURE: f32 = 0.3;
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;
    pub const MAX_CHARS_PER_REQUEST: usize = 4000;
    pub const MAX_PARALLEL_REQUESTS: usize = 4;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const SEGMENT_SEPARATOR: &str = "---";

    pub const ENV_PREFIX: &str = "INLINE_TRANSLATOR";

    pub const CONFIG_PATHS: &[&str] = &[
        "inline-translator.toml",
        ".inline-translator.toml",
        "~/.config/inline-translator/config.toml",
        "/etc/inline-translator/config.toml",
    ];
}

/// 完整配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 原文语言
    pub source_lang: String,
    /// 目标语言
    pub target_lang: String,
    pub pipeline: PipelineConfig,
    pub observer: ObserverConfig,
    pub gateway: GatewayConfig,
    /// 用户设置文件位置，未设置时设置只保存在内存中
    pub settings_path: Option<String>,
}

/// 提取与批处理配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// 可翻译文本的最小长度（字符数），会被用户设置覆盖
    pub min_text_length: usize,
    /// 每批段落数
    pub batch_size: usize,
    /// 同时进行中的批次上限
    pub max_parallel_batches: usize,
    /// 批次完成后再次排空队列前的让出时间（毫秒）
    pub drain_delay_ms: u64,
}

/// 可见性与变更观察配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObserverConfig {
    /// 元素可见比例达到该值时触发扫描
    pub threshold: f64,
    /// 视口上下扩展的预加载距离（像素）
    pub root_margin_px: f64,
    /// 扫描后重新观察的冷却时间（毫秒）
    pub rescan_delay_ms: u64,
    /// DOM 变更合并窗口（毫秒）
    pub debounce_ms: u64,
}

/// 翻译接口配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// 主翻译接口（OpenAI 兼容的 chat completions）
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 单次请求允许的最大字符数，超出后拆分为多个请求
    pub max_chars_per_request: usize,
    /// 后台同时处理的翻译请求上限
    pub max_parallel_requests: usize,
    pub timeout_secs: u64,
    /// 备用翻译接口，为空字符串时不启用
    pub fallback_url: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::SOURCE_LANG.to_string(),
            target_lang: constants::TARGET_LANG.to_string(),
            pipeline: PipelineConfig::default(),
            observer: ObserverConfig::default(),
            gateway: GatewayConfig::default(),
            settings_path: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_length: constants::MIN_TEXT_LENGTH,
            batch_size: constants::BATCH_SIZE,
            max_parallel_batches: constants::MAX_PARALLEL_BATCHES,
            drain_delay_ms: constants::DRAIN_DELAY_MS,
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: constants::OBSERVER_THRESHOLD,
            root_margin_px: constants::OBSERVER_ROOT_MARGIN_PX,
            rescan_delay_ms: constants::RESCAN_DELAY_MS,
            debounce_ms: constants::DEBOUNCE_MS,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            model: constants::DEFAULT_MODEL.to_string(),
            temperature: constants::DEFAULT_TEMPERATURE,
            max_tokens: constants::DEFAULT_MAX_TOKENS,
            max_chars_per_request: constants::MAX_CHARS_PER_REQUEST,
            max_parallel_requests: constants::MAX_PARALLEL_REQUESTS,
            timeout_secs: constants::REQUEST_TIMEOUT_SECS,
            fallback_url: constants::DEFAULT_FALLBACK_URL.to_string(),
        }
    }
}

impl TranslatorConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if !(0.0..=1.0).contains(&self.observer.threshold) {
            return Err(TranslationError::ConfigError(format!(
                "observer.threshold 必须在 0 到 1 之间: {}",
                self.observer.threshold
            )));
        }

        if self.observer.root_margin_px < 0.0 {
            return Err(TranslationError::ConfigError(
                "observer.root_margin_px 不能为负数".to_string(),
            ));
        }

        if self.pipeline.batch_size == 0 {
            return Err(TranslationError::ConfigError(
                "pipeline.batch_size 必须大于0".to_string(),
            ));
        }

        if self.pipeline.max_parallel_batches == 0 {
            return Err(TranslationError::ConfigError(
                "pipeline.max_parallel_batches 必须大于0".to_string(),
            ));
        }

        if self.gateway.max_parallel_requests == 0 {
            return Err(TranslationError::ConfigError(
                "gateway.max_parallel_requests 必须大于0".to_string(),
            ));
        }

        if self.gateway.max_chars_per_request < 2 {
            return Err(TranslationError::ConfigError(
                "gateway.max_chars_per_request 过小".to_string(),
            ));
        }

        Url::parse(&self.gateway.api_url).map_err(|e| {
            TranslationError::ConfigError(format!("无效的 gateway.api_url: {}", e))
        })?;

        if !self.gateway.fallback_url.is_empty() {
            Url::parse(&self.gateway.fallback_url).map_err(|e| {
                TranslationError::ConfigError(format!("无效的 gateway.fallback_url: {}", e))
            })?;
        }

        Ok(())
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslatorConfig,
    config_path: Option<String>,
}

impl ConfigManager {
    /// 从默认位置加载配置
    pub fn new() -> TranslationResult<Self> {
        Self::load(None)
    }

    /// 加载配置；`explicit_path` 存在时只使用该文件
    pub fn load(explicit_path: Option<&str>) -> TranslationResult<Self> {
        Self::load_dotenv();

        let mut builder = Config::builder();
        let mut config_path = None;

        match explicit_path {
            Some(path) => {
                let expanded_path = shellexpand::tilde(path);
                if !Path::new(expanded_path.as_ref()).exists() {
                    return Err(TranslationError::ConfigError(format!(
                        "配置文件不存在: {}",
                        expanded_path
                    )));
                }
                builder = builder.add_source(File::with_name(&expanded_path));
                config_path = Some(expanded_path.to_string());
            }
            None => {
                for path in constants::CONFIG_PATHS {
                    let expanded_path = shellexpand::tilde(path);
                    if Path::new(expanded_path.as_ref()).exists() {
                        builder = builder.add_source(File::with_name(&expanded_path));
                        config_path = Some(expanded_path.to_string());
                        break;
                    }
                }
            }
        }

        match &config_path {
            Some(path) => tracing::info!("加载配置文件: {}", path),
            None => tracing::info!("未找到配置文件，使用默认配置"),
        }

        // INLINE_TRANSLATOR_GATEWAY__MODEL=... 形式的环境变量
        builder = builder.add_source(
            Environment::with_prefix(constants::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: TranslatorConfig = builder
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("构建配置失败: {}", e)))?
            .try_deserialize()
            .map_err(|e| TranslationError::ConfigError(format!("反序列化配置失败: {}", e)))?;

        Self::apply_env_overrides(&mut config);
        config.validate()?;

        tracing::debug!(
            "加载的配置 - 接口: {}, 模型: {}",
            config.gateway.api_url,
            config.gateway.model
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// 直接使用给定配置
    pub fn from_config(config: TranslatorConfig) -> TranslationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// 获取当前配置
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 实际加载的配置文件
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 手动应用不带层级的环境变量
    fn apply_env_overrides(config: &mut TranslatorConfig) {
        if config.gateway.api_key.is_none() {
            if let Ok(key) = env::ApiKey::get() {
                config.gateway.api_key = Some(key);
            }
        }

        if config.settings_path.is_none() {
            if let Ok(path) = env::SettingsPath::get() {
                config.settings_path = Some(path);
            }
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                match dotenv::from_filename(env_file) {
                    Ok(_) => {
                        tracing::info!("已加载环境变量文件: {}", env_file);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("无法加载环境变量文件 {}: {}", env_file, e);
                    }
                }
            }
        }
    }
}
