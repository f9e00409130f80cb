//! 日志系统初始化
//!
//! 基于 `tracing` 的日志输出，支持：
//! - 日志级别（trace/debug/info/warn/error），可被 RUST_LOG 覆盖
//! - 输出格式（JSON/纯文本）
//! - 输出目标（控制台/文件/两者），文件输出按天滚动
//!
//! 由宿主程序在启动时调用一次 `init_logger`；库代码只通过
//! `tracing` 宏记录，不关心输出配置。

use crate::models::{LogConfig, LogFormat, LogLevel, LogOutput};
use std::sync::OnceLock;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// 初始化日志系统
///
/// 重复调用返回错误而不是 panic。
pub fn init_logger(config: &LogConfig) -> anyhow::Result<()> {
    if INITIALIZED.set(()).is_err() {
        anyhow::bail!("日志系统已初始化，不能重复初始化");
    }

    let filter = create_env_filter(config.level);

    match (config.output, config.format) {
        (LogOutput::Console, LogFormat::Text) => {
            Registry::default()
                .with(filter)
                .with(create_console_text_layer())
                .init();
        }
        (LogOutput::Console, LogFormat::Json) => {
            Registry::default()
                .with(filter)
                .with(create_console_json_layer())
                .init();
        }
        (LogOutput::File, format) => {
            let file_layer = create_file_layer(config.file_path.as_deref(), format)?;
            Registry::default().with(filter).with(file_layer).init();
        }
        (LogOutput::Both, LogFormat::Text) => {
            let file_layer = create_file_layer(config.file_path.as_deref(), LogFormat::Text)?;
            Registry::default()
                .with(filter)
                .with(create_console_text_layer())
                .with(file_layer)
                .init();
        }
        (LogOutput::Both, LogFormat::Json) => {
            let file_layer = create_file_layer(config.file_path.as_deref(), LogFormat::Json)?;
            Registry::default()
                .with(filter)
                .with(create_console_json_layer())
                .with(file_layer)
                .init();
        }
    }

    tracing::info!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        "日志系统初始化完成"
    );
    Ok(())
}

/// 创建环境过滤器
///
/// 优先从 RUST_LOG 读取，未设置时应用代码使用配置级别，
/// 第三方库固定为 warn。
fn create_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("envswitch={}", level.as_str())))
}

fn create_console_text_layer<S>() -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(cfg!(debug_assertions))
        .with_ansi(true)
        .boxed()
}

fn create_console_json_layer<S>() -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(std::io::stdout)
        .with_target(cfg!(debug_assertions))
        .with_ansi(false)
        .boxed()
}

/// 创建按天滚动的文件输出层
fn create_file_layer<S>(
    file_path: Option<&str>,
    format: LogFormat,
) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let log_dir = resolve_log_dir(file_path)?;
    let file_appender = rolling::daily(log_dir, "envswitch");
    let (non_blocking, guard) = non_blocking(file_appender);

    // guard 决定后台刷盘线程的生命周期，泄漏使其伴随进程存活
    Box::leak(Box::new(guard));

    let layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(non_blocking)
            .with_target(cfg!(debug_assertions))
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
    };
    Ok(layer)
}

/// 日志目录：显式配置优先，否则 ~/.envswitch/logs
fn resolve_log_dir(file_path: Option<&str>) -> anyhow::Result<std::path::PathBuf> {
    match file_path {
        Some(path) => Ok(std::path::PathBuf::from(path)),
        None => {
            let log_dir = dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("无法获取用户主目录"))?
                .join(".envswitch")
                .join("logs");
            std::fs::create_dir_all(&log_dir)?;
            Ok(log_dir)
        }
    }
}
