//! 版本探测
//!
//! 对单个候选可执行文件执行版本查询并提取版本号。除了
//! 启动一个短命子进程外没有副作用。任何失败（启动失败、
//! 非零退出、超时、版本格式不匹配）都返回 `None`，绝不向
//! 调用方抛错，一个候选的失败不影响其余候选的扫描。

use crate::models::{ProbeStream, ToolSpec};
use crate::utils::command::{run_version_command, CommandResult, DEFAULT_PROBE_TIMEOUT};
use std::path::Path;
use std::time::Duration;

/// 版本探测器
pub struct VersionProbe {
    timeout: Duration,
}

impl VersionProbe {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// 指定单次探测的等待上限
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 探测候选文件的版本号
    pub fn probe(&self, executable: &Path, tool: &ToolSpec) -> Option<String> {
        let result = run_version_command(executable, tool.probe_flag, self.timeout);

        if !result.success {
            tracing::debug!(
                tool = tool.name,
                executable = %executable.display(),
                exit_code = ?result.exit_code,
                "版本查询执行失败"
            );
            return None;
        }

        let version = tool.extract_version(select_stream(&result, tool.stream));
        if version.is_none() {
            tracing::debug!(
                tool = tool.name,
                executable = %executable.display(),
                "输出中未找到版本号"
            );
        }
        version
    }
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn select_stream(result: &CommandResult, stream: ProbeStream) -> &str {
    match stream {
        ProbeStream::Stdout => &result.stdout,
        ProbeStream::Stderr => &result.stderr,
    }
}
