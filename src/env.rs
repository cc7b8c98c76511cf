//! 环境变量管理
//!
//! 不带层级的少数变量在这里定义；分层配置项见 `translation::config`
//! （`INLINE_TRANSLATOR_<SECTION>__<KEY>`）。

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 主翻译接口的密钥
pub struct ApiKey;
impl EnvVar<String> for ApiKey {
    const NAME: &'static str = "INLINE_TRANSLATOR_API_KEY";
    const DEFAULT: Option<String> = None;
    const DESCRIPTION: &'static str = "Bearer key for the chat completions endpoint";

    fn parse(value: &str) -> EnvResult<String> {
        let key = value.trim();
        if key.is_empty() {
            return Err(EnvError {
                variable: Self::NAME.to_string(),
                message: "API key is empty".to_string(),
            });
        }
        Ok(key.to_string())
    }
}

/// 日志级别
pub struct LogLevel;
impl EnvVar<String> for LogLevel {
    const NAME: &'static str = "INLINE_TRANSLATOR_LOG";
    const DEFAULT: Option<String> = None;
    const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

    fn get() -> EnvResult<String> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok("info".to_string()),
        }
    }

    fn parse(value: &str) -> EnvResult<String> {
        match value.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
            _ => Err(EnvError {
                variable: Self::NAME.to_string(),
                message: format!(
                    "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                    value
                ),
            }),
        }
    }
}

/// 用户设置文件
pub struct SettingsPath;
impl EnvVar<String> for SettingsPath {
    const NAME: &'static str = "INLINE_TRANSLATOR_SETTINGS";
    const DEFAULT: Option<String> = None;
    const DESCRIPTION: &'static str = "Path of the TOML file holding user settings";

    fn parse(value: &str) -> EnvResult<String> {
        Ok(shellexpand::tilde(value.trim()).to_string())
    }
}

/// 禁用颜色输出
pub struct NoColor;
impl EnvVar<bool> for NoColor {
    const NAME: &'static str = "NO_COLOR";
    const DEFAULT: Option<bool> = Some(false);
    const DESCRIPTION: &'static str = "Disable colored output when set to any value";

    fn parse(value: &str) -> EnvResult<bool> {
        Ok(!value.is_empty())
    }
}
