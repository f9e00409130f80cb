// 日志配置结构，放在 models 以便在库和宿主程序之间共享

use serde::{Deserialize, Serialize};

/// 日志级别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

/// 日志配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default)]
    pub level: LogLevel,
    /// 输出格式（文本/JSON）
    #[serde(default)]
    pub format: LogFormat,
    /// 输出目标（控制台/文件/两者）
    #[serde(default)]
    pub output: LogOutput,
    /// 文件输出目录（None 时使用 ~/.envswitch/logs）
    #[serde(default)]
    pub file_path: Option<String>,
}
