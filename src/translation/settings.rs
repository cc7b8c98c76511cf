//! 用户设置
//!
//! 设置保存在一个 TOML 文件中，键名与页面消息一致（camelCase）。
//! 没有配置路径时只保存在内存里。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::translation::config::{constants, TranslatorConfig};
use crate::translation::error::TranslationResult;

/// 用户可修改的设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// 是否启用翻译
    pub enabled: bool,
    /// 最小文本长度
    pub min_text_length: usize,
    /// 使用的模型
    pub translation_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_text_length: constants::MIN_TEXT_LENGTH,
            translation_model: constants::DEFAULT_MODEL.to_string(),
        }
    }
}

impl Settings {
    /// 以配置中的值作为默认设置
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            enabled: true,
            min_text_length: config.pipeline.min_text_length,
            translation_model: config.gateway.model.clone(),
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(min_text_length) = patch.min_text_length {
            self.min_text_length = min_text_length;
        }
        if let Some(model) = &patch.translation_model {
            self.translation_model = model.clone();
        }
    }
}

/// 部分更新，缺省字段保持不变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_text_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_model: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.min_text_length.is_none() && self.translation_model.is_none()
    }
}

/// 设置存储
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    settings: Settings,
}

impl SettingsStore {
    /// 只在内存中保存
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            settings,
        }
    }

    /// 读取设置文件并合并到 `defaults`，文件中缺少的键保持 `defaults` 的值
    pub fn load(path: Option<&str>, defaults: Settings) -> TranslationResult<Self> {
        let Some(path) = path else {
            return Ok(Self::in_memory(defaults));
        };

        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        let mut settings = defaults;
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let stored: SettingsPatch = toml::from_str(&content)?;
            settings.apply(&stored);
            tracing::debug!("已读取设置文件: {}", path.display());
        }

        Ok(Self {
            path: Some(path),
            settings,
        })
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 合并更新并写回文件
    pub fn apply(&mut self, patch: &SettingsPatch) -> TranslationResult<&Settings> {
        self.settings.apply(patch);
        self.persist()?;
        Ok(&self.settings)
    }

    fn persist(&self) -> TranslationResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(&self.settings)?)?;
        Ok(())
    }
}
